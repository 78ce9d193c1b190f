use fail::FailScenario;

/// Configures failpoints for the lifetime of the guard.
///
/// Every configured failpoint is turned off again when the guard is dropped.
pub struct FailpointGuard<'a> {
    _scenario: FailScenario<'a>,
    names: Vec<String>,
}

impl<'a> FailpointGuard<'a> {
    /// Applies each `(name, action)` pair, using the `fail` action syntax such as `return` or
    /// `1*return(manual_retry)`.
    pub fn setup(failpoints: &[(&str, &str)]) -> FailpointGuard<'a> {
        let scenario = FailScenario::setup();
        let mut names = Vec::with_capacity(failpoints.len());

        for (name, action) in failpoints {
            fail::cfg(*name, action).unwrap();
            names.push(name.to_string());
        }

        Self {
            _scenario: scenario,
            names,
        }
    }
}

impl Drop for FailpointGuard<'_> {
    fn drop(&mut self) {
        for name in &self.names {
            fail::remove(name);
        }
    }
}
