pub mod batch_sender;
