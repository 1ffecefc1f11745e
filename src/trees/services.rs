use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::info;

use super::models::{
    LoadTreeResponse, PersonRow, RelationshipRow, SaveTreeRequest, SaveTreeResponse, TreeRow,
    TreeSummary,
};
use crate::common::{
    generate_person_id, generate_relationship_id, generate_tree_id, generate_user_id,
    safe_email_log, ApiError,
};

const DEFAULT_TREE_TITLE: &str = "Моё семейное древо";

pub struct TreesService {
    db: SqlitePool,
}

impl TreesService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All trees owned by the user, newest-updated first, each with a live
    /// person count. Unknown users simply own no trees.
    pub async fn list_trees(&self, user_email: &str) -> Result<Vec<TreeSummary>, ApiError> {
        let trees = sqlx::query_as::<_, TreeSummary>(
            r#"
            SELECT ft.id, ft.title, ft.description,
                   (SELECT COUNT(*) FROM persons p WHERE p.tree_id = ft.id) AS persons_count,
                   ft.created_at, ft.updated_at
            FROM family_trees ft
            JOIN users u ON ft.user_id = u.id
            WHERE u.email = ?
            ORDER BY ft.updated_at DESC
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(trees)
    }

    /// Load one tree as a node/edge graph.
    ///
    /// When an email is supplied the tree must belong to that user; absence
    /// and foreign ownership produce the same NotFound so callers can't
    /// probe for other users' tree ids.
    pub async fn load_tree(
        &self,
        tree_id: &str,
        user_email: Option<&str>,
    ) -> Result<LoadTreeResponse, ApiError> {
        let tree: Option<TreeRow> = match user_email {
            Some(email) => {
                sqlx::query_as(
                    r#"
                    SELECT ft.id, ft.title, ft.description, ft.created_at, ft.updated_at
                    FROM family_trees ft
                    JOIN users u ON ft.user_id = u.id
                    WHERE ft.id = ? AND u.email = ?
                    "#,
                )
                .bind(tree_id)
                .bind(email)
                .fetch_optional(&self.db)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT id, title, description, created_at, updated_at FROM family_trees WHERE id = ?",
                )
                .bind(tree_id)
                .fetch_optional(&self.db)
                .await
            }
        }
        .map_err(ApiError::DatabaseError)?;

        let tree = tree.ok_or_else(|| {
            ApiError::NotFound("Tree not found or access denied".to_string())
        })?;

        let persons: Vec<PersonRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, middle_name, maiden_name, gender,
                   birth_date, birth_place, death_date, death_place, is_alive,
                   occupation, bio, history_context, position_x, position_y
            FROM persons
            WHERE tree_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(tree_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let relationships: Vec<RelationshipRow> = sqlx::query_as(
            r#"
            SELECT id, source_person_id, target_person_id, relationship_type
            FROM relationships
            WHERE tree_id = ?
            "#,
        )
        .bind(tree_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(LoadTreeResponse {
            tree_id: tree.id,
            title: tree.title,
            description: tree.description,
            nodes: persons.into_iter().map(Into::into).collect(),
            edges: relationships.into_iter().map(Into::into).collect(),
            created_at: tree.created_at,
            updated_at: tree.updated_at,
        })
    }

    /// Save a tree: upsert the owner, update or create the tree row, then
    /// fully replace its persons and relationships in one transaction.
    ///
    /// Each inserted person carries a freshly generated id, recorded in a
    /// client-id → database-id map as the row is written; edges resolve
    /// through that map and are silently dropped when an endpoint is
    /// unknown. Duplicate (source, target, type) triples are ignored.
    pub async fn save_tree(
        &self,
        user_email: &str,
        request: SaveTreeRequest,
    ) -> Result<SaveTreeResponse, ApiError> {
        let title = request
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TREE_TITLE.to_string());
        let description = request.description.clone().unwrap_or_default();

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        // Idempotent identity resolution by email
        let (user_id,): (String,) = sqlx::query_as(
            r#"
            INSERT INTO users (id, email)
            VALUES (?, ?)
            ON CONFLICT (email) DO UPDATE SET updated_at = datetime('now')
            RETURNING id
            "#,
        )
        .bind(generate_user_id())
        .bind(user_email)
        .fetch_one(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        let tree_id = match &request.tree_id {
            Some(tree_id) => {
                // Scoped to (id, owner): a missing row covers both "doesn't
                // exist" and "not owned"
                let updated: Option<(String,)> = sqlx::query_as(
                    r#"
                    UPDATE family_trees
                    SET title = ?, description = ?, updated_at = datetime('now')
                    WHERE id = ? AND user_id = ?
                    RETURNING id
                    "#,
                )
                .bind(&title)
                .bind(&description)
                .bind(tree_id)
                .bind(&user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;

                match updated {
                    Some((id,)) => id,
                    None => {
                        return Err(ApiError::NotFound(
                            "Tree not found or access denied".to_string(),
                        ));
                    }
                }
            }
            None => {
                let tree_id = generate_tree_id();
                sqlx::query(
                    "INSERT INTO family_trees (id, user_id, title, description) VALUES (?, ?, ?, ?)",
                )
                .bind(&tree_id)
                .bind(&user_id)
                .bind(&title)
                .bind(&description)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;
                tree_id
            }
        };

        // Full replace: relationships first, they reference person rows
        sqlx::query("DELETE FROM relationships WHERE tree_id = ?")
            .bind(&tree_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
        sqlx::query("DELETE FROM persons WHERE tree_id = ?")
            .bind(&tree_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

        let mut id_map: HashMap<String, String> = HashMap::with_capacity(request.nodes.len());
        for node in &request.nodes {
            let person_id = generate_person_id();
            sqlx::query(
                r#"
                INSERT INTO persons (
                    id, tree_id, first_name, last_name, middle_name, maiden_name,
                    gender, birth_date, birth_place, death_date, death_place,
                    is_alive, occupation, bio, history_context, position_x, position_y
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&person_id)
            .bind(&tree_id)
            .bind(&node.first_name)
            .bind(&node.last_name)
            .bind(&node.middle_name)
            .bind(&node.maiden_name)
            .bind(&node.gender)
            .bind(&node.birth_date)
            .bind(&node.birth_place)
            .bind(&node.death_date)
            .bind(&node.death_place)
            .bind(node.is_alive)
            .bind(&node.occupation)
            .bind(&node.bio)
            .bind(&node.history_context)
            .bind(node.x)
            .bind(node.y)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

            id_map.insert(node.id.clone(), person_id);
        }

        for edge in &request.edges {
            let (Some(source_id), Some(target_id)) =
                (id_map.get(&edge.source), id_map.get(&edge.target))
            else {
                continue;
            };

            let relationship_type = if edge.edge_type.as_deref() == Some("spouse") {
                "spouse"
            } else {
                "parent"
            };

            sqlx::query(
                r#"
                INSERT OR IGNORE INTO relationships
                    (id, tree_id, source_person_id, target_person_id, relationship_type)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(generate_relationship_id())
            .bind(&tree_id)
            .bind(source_id)
            .bind(target_id)
            .bind(relationship_type)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
        }

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            tree_id = %tree_id,
            email = %safe_email_log(user_email),
            nodes = request.nodes.len(),
            edges = request.edges.len(),
            "Tree saved"
        );

        Ok(SaveTreeResponse {
            tree_id,
            message: "Tree saved successfully".to_string(),
            nodes_count: request.nodes.len(),
            edges_count: request.edges.len(),
        })
    }
}
