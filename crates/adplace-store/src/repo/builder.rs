//! SQL assembly for dynamic filters and partial updates
//!
//! Clauses and their bound values are pushed together so they cannot drift
//! apart; `build` still re-counts placeholders before anything reaches SQLite.

use rusqlite::types::Value;

use adplace_core::queries::{SelectAdsArgs, UpdateAdsArgs};

use crate::errors::{query_build, Result};

pub const AD_COLUMNS: &str = "id, title, image_url, placement, status, created_at, expires_at";

/// A statement ready to hand to a `Transport`
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// # Errors
    ///
    /// `QueryBuild` when the number of `?` placeholders differs from the
    /// number of bound values.
    pub fn new(op: &str, sql: String, params: Vec<Value>) -> Result<Self> {
        let placeholders = sql.matches('?').count();
        if placeholders != params.len() {
            return Err(query_build(
                op,
                format!(
                    "{} placeholders but {} parameters in: {}",
                    placeholders,
                    params.len(),
                    sql
                ),
            ));
        }
        Ok(Self { sql, params })
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// SELECT over `ads` with AND-ed equality predicates
#[derive(Debug, Default)]
pub struct SelectBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every present filter onto a clause; `now` is only bound when the
    /// `expired` filter is present
    pub fn from_args(args: &SelectAdsArgs, now: i64) -> Self {
        let mut builder = Self::new();
        if let Some(id) = &args.id {
            builder = builder.eq("id", text(id));
        }
        if let Some(title) = &args.title {
            builder = builder.eq("title", text(title));
        }
        if let Some(status) = args.status {
            builder = builder.eq("status", text(status.as_str()));
        }
        if let Some(placement) = &args.placement {
            builder = builder.eq("placement", text(placement));
        }
        if let Some(expired) = args.expired {
            builder = builder.expired(expired, now);
        }
        builder.limit = args.limit;
        builder.offset = args.offset;
        builder
    }

    pub fn eq(mut self, column: &str, value: Value) -> Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(value);
        self
    }

    /// Lapsed means `now > expires_at`; a missing expiration never lapses
    pub fn expired(mut self, expired: bool, now: i64) -> Self {
        let clause = if expired {
            "(expires_at IS NOT NULL AND expires_at < ?)"
        } else {
            "(expires_at IS NULL OR expires_at >= ?)"
        };
        self.clauses.push(clause.to_string());
        self.params.push(Value::Integer(now));
        self
    }

    /// # Errors
    ///
    /// `QueryBuild` when clauses and parameters disagree.
    pub fn build(self) -> Result<BuiltQuery> {
        let mut sql = format!("SELECT {} FROM ads", AD_COLUMNS);
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        BuiltQuery::new("select_ads", sql, self.params)
    }
}

/// UPDATE of a single `ads` row by id
#[derive(Debug)]
pub struct UpdateBuilder {
    id: String,
    sets: Vec<String>,
    params: Vec<Value>,
}

impl UpdateBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sets: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Every updatable column is written; absent values keep the stored one
    pub fn from_args(args: &UpdateAdsArgs) -> Self {
        Self::new(args.id.clone())
            .coalesce("title", args.title.as_deref().map(text))
            .coalesce("image_url", args.image_url.as_deref().map(text))
            .coalesce("placement", args.placement.as_deref().map(text))
            .coalesce("status", args.status.map(|s| text(s.as_str())))
    }

    pub fn coalesce(mut self, column: &str, value: Option<Value>) -> Self {
        self.sets.push(format!("{0} = COALESCE(?, {0})", column));
        self.params.push(value.unwrap_or(Value::Null));
        self
    }

    /// # Errors
    ///
    /// `QueryBuild` when there is nothing to SET or clauses and parameters
    /// disagree.
    pub fn build(self) -> Result<BuiltQuery> {
        if self.sets.is_empty() {
            return Err(query_build("update_ads", "update has no columns to set"));
        }
        let sql = format!("UPDATE ads SET {} WHERE id = ?", self.sets.join(", "));
        let mut params = self.params;
        params.push(Value::Text(self.id));
        BuiltQuery::new("update_ads", sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adplace_core::{AdStatus, ExErrorKind};

    #[test]
    fn test_unfiltered_select_has_no_where() {
        let q = SelectBuilder::from_args(&SelectAdsArgs::all(), 0).build().unwrap();
        assert_eq!(
            q.sql,
            format!(
                "SELECT {} FROM ads ORDER BY created_at DESC, rowid DESC",
                AD_COLUMNS
            )
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_filters_are_anded_in_order() {
        let args = SelectAdsArgs::all()
            .with_placement("homepage")
            .with_status(AdStatus::Active);
        let q = SelectBuilder::from_args(&args, 0).build().unwrap();

        assert!(q.sql.contains("WHERE status = ? AND placement = ?"));
        assert_eq!(
            q.params,
            vec![text("active"), text("homepage")]
        );
    }

    #[test]
    fn test_expired_filter_binds_now() {
        let args = SelectAdsArgs::all().with_expired(true);
        let q = SelectBuilder::from_args(&args, 42).build().unwrap();

        assert!(q.sql.contains("expires_at IS NOT NULL AND expires_at < ?"));
        assert_eq!(q.params, vec![Value::Integer(42)]);
    }

    #[test]
    fn test_paging_clauses() {
        let q = SelectBuilder::from_args(&SelectAdsArgs::all().with_limit(5), 0)
            .build()
            .unwrap();
        assert!(q.sql.ends_with("LIMIT 5"));

        let q = SelectBuilder::from_args(&SelectAdsArgs::all().with_offset(3), 0)
            .build()
            .unwrap();
        assert!(q.sql.ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn test_placeholder_mismatch_is_query_build() {
        let err = BuiltQuery::new("select_ads", "SELECT ? , ?".to_string(), vec![Value::Null])
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::QueryBuild);
    }

    #[test]
    fn test_update_coalesces_every_column() {
        let q = UpdateBuilder::from_args(&UpdateAdsArgs::deactivate("ad-1"))
            .build()
            .unwrap();

        assert_eq!(
            q.sql,
            "UPDATE ads SET title = COALESCE(?, title), image_url = COALESCE(?, image_url), \
             placement = COALESCE(?, placement), status = COALESCE(?, status) WHERE id = ?"
        );
        assert_eq!(
            q.params,
            vec![
                Value::Null,
                Value::Null,
                Value::Null,
                text("inactive"),
                text("ad-1")
            ]
        );
    }

    #[test]
    fn test_empty_update_is_query_build() {
        let err = UpdateBuilder::new("ad-1").build().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::QueryBuild);
    }
}
