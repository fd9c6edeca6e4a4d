use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Category, Gender, Look, Piece, Season, User};

use super::{PieceFilter, Store};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_gender(raw: &str) -> AppResult<Gender> {
    Gender::parse(raw).ok_or_else(|| AppError::Internal(format!("invalid gender column: {raw}")))
}

fn user_from_row(row: &PgRow) -> AppResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        gender: parse_gender(row.try_get::<String, _>("gender")?.as_str())?,
        is_admin: row.try_get("is_admin")?,
        wardrobe: row.try_get("wardrobe")?,
        favorites: row.try_get("favorites")?,
        hidden_looks: row.try_get("hidden_looks")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn category_from_row(row: &PgRow) -> AppResult<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        gender: parse_gender(row.try_get::<String, _>("gender")?.as_str())?,
        parent: row.try_get("parent")?,
        children: row.try_get("children")?,
        ancestors: row.try_get("ancestors")?,
    })
}

fn piece_from_row(row: &PgRow) -> AppResult<Piece> {
    Ok(Piece {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        gender: parse_gender(row.try_get::<String, _>("gender")?.as_str())?,
        category: row.try_get("category")?,
        img: row.try_get("img")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn look_from_row(row: &PgRow) -> AppResult<Look> {
    let season = row
        .try_get::<Option<String>, _>("season")?
        .map(|raw| {
            Season::parse(&raw)
                .ok_or_else(|| AppError::Internal(format!("invalid season column: {raw}")))
        })
        .transpose()?;

    Ok(Look {
        id: row.try_get("id")?,
        pieces: row.try_get("pieces")?,
        gender: parse_gender(row.try_get::<String, _>("gender")?.as_str())?,
        season,
        img: row.try_get("img")?,
        author: row.try_get("author")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, password_hash, gender, is_admin,
                               wardrobe, favorites, hidden_looks, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.gender.as_str())
        .bind(user.is_admin)
        .bind(&user.wardrobe)
        .bind(&user.favorites)
        .bind(&user.hidden_looks)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_name_taken(&self, name: &str) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn update_user_sets(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET wardrobe = $2, favorites = $3, hidden_looks = $4 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.wardrobe)
        .bind(&user.favorites)
        .bind(&user.hidden_looks)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_session(&self, token: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.* FROM users u
            JOIN sessions s ON s.user_id = u.id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, gender, parent, children, ancestors)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.gender.as_str())
        .bind(category.parent)
        .bind(&category.children)
        .bind(&category.ancestors)
        .execute(&mut *tx)
        .await?;

        if let Some(parent) = category.parent {
            sqlx::query("UPDATE categories SET children = array_append(children, $1) WHERE id = $2")
                .bind(category.id)
                .bind(parent)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn category_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn all_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn category_name_taken(&self, name: &str, gender: Gender) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE name = $1 AND gender = $2)",
        )
        .bind(name)
        .bind(gender.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<()> {
        sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_category_subtree(&self, root: &Category, subtree: &[Uuid]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
            .bind(subtree)
            .execute(&mut *tx)
            .await?;
        if let Some(parent) = root.parent {
            sqlx::query("UPDATE categories SET children = array_remove(children, $1) WHERE id = $2")
                .bind(root.id)
                .bind(parent)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_piece(&self, piece: &Piece) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pieces (id, name, gender, category, img, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(piece.id)
        .bind(&piece.name)
        .bind(piece.gender.as_str())
        .bind(piece.category)
        .bind(&piece.img)
        .bind(piece.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn piece_by_id(&self, id: Uuid) -> AppResult<Option<Piece>> {
        let row = sqlx::query("SELECT * FROM pieces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(piece_from_row).transpose()
    }

    async fn pieces_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Piece>> {
        let rows = sqlx::query("SELECT * FROM pieces WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(piece_from_row).collect()
    }

    async fn find_pieces(&self, filter: &PieceFilter) -> AppResult<Vec<Piece>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM pieces
            WHERE ($1::text IS NULL OR gender = $1)
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
              AND ($3::uuid[] IS NULL OR category = ANY($3))
              AND ($4::uuid[] IS NULL OR id = ANY($4))
            ORDER BY id
            "#,
        )
        .bind(filter.gender.map(|gender| gender.as_str()))
        .bind(filter.search.as_deref())
        .bind(filter.categories.as_deref())
        .bind(filter.ids.as_deref())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(piece_from_row).collect()
    }

    async fn piece_name_taken(&self, name: &str, gender: Gender, exclude: Option<Uuid>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pieces
                WHERE name = $1 AND gender = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(name)
        .bind(gender.as_str())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_piece(&self, piece: &Piece) -> AppResult<()> {
        sqlx::query("UPDATE pieces SET name = $2, gender = $3, category = $4, img = $5 WHERE id = $1")
            .bind(piece.id)
            .bind(&piece.name)
            .bind(piece.gender.as_str())
            .bind(piece.category)
            .bind(&piece.img)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_piece(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM pieces WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_look(&self, look: &Look) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO looks (id, pieces, gender, season, img, author, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(look.id)
        .bind(&look.pieces)
        .bind(look.gender.as_str())
        .bind(look.season.map(|season| season.as_str()))
        .bind(&look.img)
        .bind(look.author)
        .bind(look.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn look_by_id(&self, id: Uuid) -> AppResult<Option<Look>> {
        let row = sqlx::query("SELECT * FROM looks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(look_from_row).transpose()
    }

    async fn looks_by_gender(&self, gender: Gender) -> AppResult<Vec<Look>> {
        let rows = sqlx::query("SELECT * FROM looks WHERE gender = $1 ORDER BY id")
            .bind(gender.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(look_from_row).collect()
    }

    async fn looks_with_piece(&self, piece_id: Uuid) -> AppResult<Vec<Look>> {
        let rows = sqlx::query("SELECT * FROM looks WHERE $1 = ANY(pieces) ORDER BY id")
            .bind(piece_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(look_from_row).collect()
    }

    async fn delete_look(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM looks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn scrub_look_refs(&self, look_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET favorites = array_remove(favorites, $1),
                hidden_looks = array_remove(hidden_looks, $1)
            WHERE $1 = ANY(favorites) OR $1 = ANY(hidden_looks)
            "#,
        )
        .bind(look_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
