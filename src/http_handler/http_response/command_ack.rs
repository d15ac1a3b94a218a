/// Response of every piloting and link endpoint of the bridge.
#[derive(serde::Deserialize, Debug, Clone)]
pub(crate) struct CommandAckResponse {
    /// Whether the vehicle accepted the command.
    success: bool,
    /// Optional explanation, mostly present on refusal.
    #[serde(default)]
    message: Option<String>,
}

impl CommandAckResponse {
    pub(crate) fn is_success(&self) -> bool { self.success }
    pub(crate) fn message(&self) -> &str { self.message.as_deref().unwrap_or("") }
}
