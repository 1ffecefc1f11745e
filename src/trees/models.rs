//! Family tree data models
//!
//! The wire format of nodes and edges is the canvas schema the frontend
//! renders: camelCase person fields, string ids, explicit x/y positions, and
//! an edge `type` that is only present for spouse edges (parent is the
//! implicit default).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

fn default_true() -> bool {
    true
}

/// Tree summary row returned by the listing endpoint
#[derive(FromRow, Serialize, Debug)]
pub struct TreeSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub persons_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ListTreesResponse {
    pub trees: Vec<TreeSummary>,
    pub count: usize,
}

#[derive(Deserialize, Debug)]
pub struct ListTreesQuery {
    pub user_email: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoadTreeQuery {
    pub tree_id: Option<String>,
    pub user_email: Option<String>,
}

/// Incoming canvas node; `id` is the client-side node id, only meaningful
/// for resolving edge endpoints within the same request.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeInput {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub maiden_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub birth_place: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub death_place: Option<String>,
    #[serde(default = "default_true")]
    pub is_alive: bool,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub history_context: Option<String>,
}

/// Incoming canvas edge; `source`/`target` reference client-side node ids.
#[derive(Deserialize, Debug, Clone)]
pub struct EdgeInput {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub edge_type: Option<String>,
}

/// Outgoing canvas node; NULL columns are flattened to empty strings so the
/// canvas never sees nulls.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub maiden_name: String,
    pub gender: String,
    pub birth_date: String,
    pub birth_place: String,
    pub death_date: String,
    pub death_place: String,
    pub is_alive: bool,
    pub occupation: String,
    pub relation: String,
    pub bio: String,
    pub history_context: String,
}

#[derive(Serialize, Debug)]
pub struct EdgeOutput {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

#[derive(FromRow, Debug)]
pub struct TreeRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(FromRow, Debug)]
pub struct PersonRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub maiden_name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub death_date: Option<String>,
    pub death_place: Option<String>,
    pub is_alive: Option<i64>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
    pub history_context: Option<String>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

impl From<PersonRow> for NodeOutput {
    fn from(row: PersonRow) -> Self {
        NodeOutput {
            id: row.id,
            x: row.position_x.unwrap_or(0.0),
            y: row.position_y.unwrap_or(0.0),
            first_name: row.first_name.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            middle_name: row.middle_name.unwrap_or_default(),
            maiden_name: row.maiden_name.unwrap_or_default(),
            gender: row.gender.unwrap_or_else(|| "male".to_string()),
            birth_date: row.birth_date.unwrap_or_default(),
            birth_place: row.birth_place.unwrap_or_default(),
            death_date: row.death_date.unwrap_or_default(),
            death_place: row.death_place.unwrap_or_default(),
            is_alive: row.is_alive.map(|v| v != 0).unwrap_or(true),
            occupation: row.occupation.unwrap_or_default(),
            relation: String::new(),
            bio: row.bio.unwrap_or_default(),
            history_context: row.history_context.unwrap_or_default(),
        }
    }
}

#[derive(FromRow, Debug)]
pub struct RelationshipRow {
    pub id: String,
    pub source_person_id: String,
    pub target_person_id: String,
    pub relationship_type: String,
}

impl From<RelationshipRow> for EdgeOutput {
    fn from(row: RelationshipRow) -> Self {
        let edge_type = (row.relationship_type == "spouse").then(|| "spouse".to_string());
        EdgeOutput {
            id: row.id,
            source: row.source_person_id,
            target: row.target_person_id,
            edge_type,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct LoadTreeResponse {
    pub tree_id: String,
    pub title: String,
    pub description: Option<String>,
    pub nodes: Vec<NodeOutput>,
    pub edges: Vec<EdgeOutput>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SaveTreeRequest {
    pub user_email: Option<String>,
    pub tree_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
}

#[derive(Serialize, Debug)]
pub struct SaveTreeResponse {
    pub tree_id: String,
    pub message: String,
    pub nodes_count: usize,
    pub edges_count: usize,
}
