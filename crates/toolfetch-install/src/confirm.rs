//! Download confirmation

use std::fmt;

/// Question put to the user before a non-silent download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPrompt {
    pub tool: String,
    /// Empty when no installed version was detected
    pub current_version: String,
    pub required_version: String,
}

impl DownloadPrompt {
    pub fn title(&self) -> String {
        format!("{} tool required", self.tool)
    }

    pub fn message(&self) -> String {
        if self.current_version.is_empty() {
            format!(
                "{tool} not found , do you want to download {tool} {required} ?",
                tool = self.tool,
                required = self.required_version
            )
        } else {
            format!(
                "{tool} {current} found, required version is {required}, do you want to download {tool} ?",
                tool = self.tool,
                current = self.current_version,
                required = self.required_version
            )
        }
    }
}

impl fmt::Display for DownloadPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Yes/no answer to a [`DownloadPrompt`]
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &DownloadPrompt) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&DownloadPrompt) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &DownloadPrompt) -> bool {
        self(prompt)
    }
}

/// Accepts every download
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &DownloadPrompt) -> bool {
        true
    }
}

/// Declines every download, leaving the tool to `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &DownloadPrompt) -> bool {
        false
    }
}
