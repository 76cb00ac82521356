use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Returns a themed, actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CliError::Config(_) => Some(
                "Check topocause.toml (or $TOPOCAUSE_CONFIG) for syntax errors and out-of-range thresholds."
                    .to_string(),
            ),
            CliError::Input(_) => {
                Some("Topology, alarm and dataset files may be .json, .yaml/.yml or .toml.".to_string())
            }
            CliError::UnknownDevice(_) => {
                Some("Device ids are case-sensitive; check the keys of your topology file.".to_string())
            }
            CliError::UnknownScenario(_) => {
                Some("Run `topocause scenarios list` to see the available ids.".to_string())
            }
            CliError::Runtime(_) => None,
        }
    }

    pub fn render(&self) {
        eprintln!("\n{} {}", console::style("Error:").red().bold(), self);
        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", console::style("  help:").dim(), s);
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CliError>() {
            Ok(cli) => cli,
            Err(other) => CliError::Runtime(format!("{other:#}")),
        }
    }
}
