use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use super::AdminState;

#[derive(Serialize)]
pub struct GatewayStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
}

#[derive(Serialize)]
pub struct ProcedureEntry {
    pub name: String,
    pub kind: &'static str,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<GatewayStatus> {
    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        routes: state.registry.len(),
    })
}

pub async fn get_procedures(State(state): State<AdminState>) -> Json<Vec<ProcedureEntry>> {
    let entries = state
        .registry
        .descriptors()
        .into_iter()
        .map(|d| ProcedureEntry {
            name: d.name.to_string(),
            kind: d.kind.as_str(),
            method: d.method.to_string(),
            path: d.path.to_string(),
            description: d.description.map(str::to_string),
            input_schema: d.input_schema.cloned(),
            output_schema: d.output_schema.cloned(),
        })
        .collect();

    Json(entries)
}
