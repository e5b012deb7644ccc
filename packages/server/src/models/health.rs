use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: &'static str,
    #[schema(example = "dojo-relay")]
    pub service: &'static str,
    /// Open WebSocket connections.
    #[schema(example = 42)]
    pub connections: usize,
    /// Groups with at least one member.
    #[schema(example = 7)]
    pub groups: usize,
}
