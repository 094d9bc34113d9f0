use clap::ValueEnum;
use serde::Deserialize;

#[derive(ValueEnum, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Stream tool output live.
    #[default]
    Stream,
    /// Print each tool's output as a single block after it exits.
    Group,
}
