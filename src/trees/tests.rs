//! Tests for trees module
//!
//! These tests verify the save/load/list contract:
//! - saving fully replaces a tree's persons and relationships
//! - edges with unknown endpoints are dropped, not errored
//! - the wire format of nodes and edges

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use super::super::models::{EdgeOutput, NodeOutput, PersonRow, SaveTreeRequest};
    use super::super::services::TreesService;
    use crate::common::migrations::run_migrations;
    use crate::common::ApiError;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    fn save_request(body: Value) -> SaveTreeRequest {
        serde_json::from_value(body).expect("valid save request")
    }

    fn family_request(tree_id: Option<&str>) -> SaveTreeRequest {
        save_request(json!({
            "tree_id": tree_id,
            "title": "Petrov family",
            "nodes": [
                {"id": "n1", "firstName": "Ivan", "lastName": "Petrov", "x": 10.5, "y": 20.0},
                {"id": "n2", "firstName": "Anna", "gender": "female", "isAlive": false},
                {"id": "n3", "firstName": "Oleg"}
            ],
            "edges": [
                {"source": "n1", "target": "n3"},
                {"source": "n1", "target": "n2", "type": "spouse"},
                {"source": "n1", "target": "missing"}
            ]
        }))
    }

    // ---- save and load ----

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let saved = service
            .save_tree("a@x.com", family_request(None))
            .await
            .expect("save should succeed");

        // Counts report the input arrays, dropped edges included
        assert_eq!(saved.nodes_count, 3);
        assert_eq!(saved.edges_count, 3);
        assert!(saved.tree_id.starts_with("T_"));

        let loaded = service.load_tree(&saved.tree_id, None).await.unwrap();

        assert_eq!(loaded.title, "Petrov family");
        assert_eq!(loaded.nodes.len(), 3);
        // The edge referencing an unknown node id was dropped silently
        assert_eq!(loaded.edges.len(), 2);

        // Node order is insertion order, ids are regenerated server-side
        assert_eq!(loaded.nodes[0].first_name, "Ivan");
        assert!(loaded.nodes[0].id.starts_with("P_"));
        assert_eq!(loaded.nodes[0].x, 10.5);
        assert_eq!(loaded.nodes[1].gender, "female");
        assert!(!loaded.nodes[1].is_alive);

        let spouse_edges: Vec<&EdgeOutput> = loaded
            .edges
            .iter()
            .filter(|e| e.edge_type.as_deref() == Some("spouse"))
            .collect();
        assert_eq!(spouse_edges.len(), 1);
    }

    #[tokio::test]
    async fn test_save_twice_replaces_content() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let first = service.save_tree("a@x.com", family_request(None)).await.unwrap();

        let second = service
            .save_tree(
                "a@x.com",
                save_request(json!({
                    "tree_id": first.tree_id,
                    "title": "Reduced",
                    "nodes": [{"id": "only", "firstName": "Solo"}],
                    "edges": []
                })),
            )
            .await
            .unwrap();

        assert_eq!(second.tree_id, first.tree_id);

        let loaded = service.load_tree(&first.tree_id, None).await.unwrap();
        assert_eq!(loaded.title, "Reduced");
        assert_eq!(loaded.nodes.len(), 1, "old persons are replaced, not appended");
        assert_eq!(loaded.edges.len(), 0);
        assert_eq!(loaded.nodes[0].first_name, "Solo");
    }

    #[tokio::test]
    async fn test_save_with_foreign_tree_id_is_not_found() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let owned = service.save_tree("owner@x.com", family_request(None)).await.unwrap();

        let err = service
            .save_tree("intruder@x.com", family_request(Some(&owned.tree_id)))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(_)), "got {:?}", err);

        // The failed save must not have touched the owner's data
        let loaded = service.load_tree(&owned.tree_id, None).await.unwrap();
        assert_eq!(loaded.nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_save_with_unknown_tree_id_is_not_found() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let err = service
            .save_tree("a@x.com", family_request(Some("T_MISSING")))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_applies_default_title_and_empty_arrays() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let saved = service
            .save_tree("a@x.com", save_request(json!({})))
            .await
            .unwrap();
        assert_eq!(saved.nodes_count, 0);
        assert_eq!(saved.edges_count, 0);

        let loaded = service.load_tree(&saved.tree_id, None).await.unwrap();
        assert_eq!(loaded.title, "Моё семейное древо");
        assert!(loaded.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_edges_are_ignored() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let saved = service
            .save_tree(
                "a@x.com",
                save_request(json!({
                    "nodes": [{"id": "n1"}, {"id": "n2"}],
                    "edges": [
                        {"source": "n1", "target": "n2"},
                        {"source": "n1", "target": "n2"},
                        {"source": "n1", "target": "n2", "type": "spouse"}
                    ]
                })),
            )
            .await
            .unwrap();

        let loaded = service.load_tree(&saved.tree_id, None).await.unwrap();
        // The duplicate parent edge collapses; the spouse edge is distinct
        assert_eq!(loaded.edges.len(), 2);
    }

    // ---- ownership scoping on load ----

    #[tokio::test]
    async fn test_load_scoped_by_owner_email() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let saved = service.save_tree("owner@x.com", family_request(None)).await.unwrap();

        // Owner sees the tree
        let loaded = service
            .load_tree(&saved.tree_id, Some("owner@x.com"))
            .await
            .unwrap();
        assert_eq!(loaded.tree_id, saved.tree_id);

        // Another user's email behaves exactly like a missing tree
        let err = service
            .load_tree(&saved.tree_id, Some("other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(_)));

        // No email: unauthenticated read path
        assert!(service.load_tree(&saved.tree_id, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_unknown_tree_is_not_found() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let err = service.load_tree("T_MISSING", None).await.unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(_)));
    }

    // ---- listing ----

    #[tokio::test]
    async fn test_list_trees_empty_for_unknown_user() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let trees = service.list_trees("nobody@x.com").await.unwrap();
        assert!(trees.is_empty());
    }

    #[tokio::test]
    async fn test_list_trees_reports_person_counts() {
        let pool = test_pool().await;
        let service = TreesService::new(pool.clone());

        let first = service.save_tree("a@x.com", family_request(None)).await.unwrap();
        service
            .save_tree(
                "a@x.com",
                save_request(json!({
                    "title": "Second",
                    "nodes": [{"id": "n1"}],
                    "edges": []
                })),
            )
            .await
            .unwrap();
        // Trees of other users stay out of the listing
        service.save_tree("b@x.com", family_request(None)).await.unwrap();

        let trees = service.list_trees("a@x.com").await.unwrap();
        assert_eq!(trees.len(), 2);

        let by_id = |id: &str| trees.iter().find(|t| t.id == id).unwrap();
        assert_eq!(by_id(&first.tree_id).persons_count, 3);
    }

    // ---- wire format ----

    #[test]
    fn test_node_output_flattens_nulls() {
        let row = PersonRow {
            id: "P_1".to_string(),
            first_name: None,
            last_name: None,
            middle_name: None,
            maiden_name: None,
            gender: None,
            birth_date: None,
            birth_place: None,
            death_date: None,
            death_place: None,
            is_alive: None,
            occupation: None,
            bio: None,
            history_context: None,
            position_x: None,
            position_y: None,
        };

        let node: NodeOutput = row.into();
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["firstName"], "");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["isAlive"], true);
        assert_eq!(value["x"], 0.0);
        assert_eq!(value["historyContext"], "");
    }

    #[test]
    fn test_edge_type_emitted_only_for_spouse() {
        let parent = EdgeOutput {
            id: "R_1".to_string(),
            source: "P_1".to_string(),
            target: "P_2".to_string(),
            edge_type: None,
        };
        let spouse = EdgeOutput {
            id: "R_2".to_string(),
            source: "P_1".to_string(),
            target: "P_2".to_string(),
            edge_type: Some("spouse".to_string()),
        };

        let parent_value = serde_json::to_value(&parent).unwrap();
        let spouse_value = serde_json::to_value(&spouse).unwrap();

        assert!(parent_value.get("type").is_none());
        assert_eq!(spouse_value["type"], "spouse");
    }
}
