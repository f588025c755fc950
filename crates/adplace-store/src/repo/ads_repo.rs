//! Advertisement persistence
//!
//! Free functions over any `Transport` so callers can compose several of
//! them inside one `Session`. Boundary logging belongs to the engine; this
//! layer only emits debug events.

use rusqlite::types::{Type, Value};
use rusqlite::Row;

use adplace_core::model::{unix_now, AdStatus, Advertisement};
use adplace_core::queries::{SelectAdsArgs, UpdateAdsArgs};
use adplace_core::rules::validation;
use adplace_core::ExError;

use crate::errors::{not_found, Result};
use crate::repo::builder::{SelectBuilder, UpdateBuilder, AD_COLUMNS};
use crate::transport::Transport;

/// Insert a fully populated record as-is
///
/// # Errors
///
/// Storage error on a constraint violation (duplicate id included) or a
/// transport failure.
pub fn insert_ad<T: Transport + ?Sized>(tx: &T, ad: &Advertisement) -> Result<()> {
    let sql = format!("INSERT INTO ads ({}) VALUES (?, ?, ?, ?, ?, ?, ?)", AD_COLUMNS);
    let params = vec![
        Value::Text(ad.id.clone()),
        Value::Text(ad.title.clone()),
        Value::Text(ad.image_url.clone()),
        Value::Text(ad.placement.clone()),
        Value::Text(ad.status.as_str().to_string()),
        Value::Integer(ad.created_at),
        ad.expires_at.map_or(Value::Null, Value::Integer),
    ];

    tx.execute("insert_ad", &sql, &params)
        .map_err(|e| e.with_entity_id(ad.id.clone()))?;
    tracing::debug!(ad_id = %ad.id, placement = %ad.placement, "inserted advertisement");
    Ok(())
}

/// Select with the current wall clock as the expiration reference
///
/// # Errors
///
/// See [`select_ads_at`].
pub fn select_ads<T: Transport + ?Sized>(tx: &T, args: &SelectAdsArgs) -> Result<Vec<Advertisement>> {
    select_ads_at(tx, args, unix_now())
}

/// Every record matching all present filters, newest first
///
/// An empty match is an empty vector.
///
/// # Errors
///
/// `QueryBuild` when the statement cannot be assembled, `Storage` when the
/// read fails or a stored row is malformed.
pub fn select_ads_at<T: Transport + ?Sized>(
    tx: &T,
    args: &SelectAdsArgs,
    now: i64,
) -> Result<Vec<Advertisement>> {
    let query = SelectBuilder::from_args(args, now).build()?;
    let ads = tx.query("select_ads", &query.sql, &query.params, row_to_advertisement)?;
    tracing::debug!(result_len = ads.len(), "selected advertisements");
    Ok(ads)
}

/// One record by id
///
/// # Errors
///
/// `Validation` for an empty id, `NotFound` when no row has it.
pub fn get_ad<T: Transport + ?Sized>(tx: &T, id: &str) -> Result<Advertisement> {
    validation::validate_id(id).map_err(|e| ExError::from(e).with_op("get_ad"))?;
    select_ads(tx, &SelectAdsArgs::by_id(id))?
        .into_iter()
        .next()
        .ok_or_else(|| not_found("get_ad", id))
}

/// Apply a partial update in a single statement
///
/// There is no pre-read: a zero affected-row count means the id is unknown.
/// An update with no fields still runs and therefore doubles as an existence
/// check.
///
/// # Errors
///
/// `Validation` before any I/O for an empty id or a bad supplied value,
/// `NotFound` when the id matches nothing, `Storage` on write failure.
pub fn update_ads<T: Transport + ?Sized>(tx: &T, args: &UpdateAdsArgs) -> Result<()> {
    args.validate()
        .map_err(|e| ExError::from(e).with_op("update_ads").with_entity_id(args.id.clone()))?;

    let query = UpdateBuilder::from_args(args).build()?;
    let affected = tx.execute("update_ads", &query.sql, &query.params)?;
    if affected == 0 {
        return Err(not_found("update_ads", &args.id));
    }

    tracing::debug!(ad_id = %args.id, "updated advertisement");
    Ok(())
}

/// Map a row selected with `AD_COLUMNS`
///
/// A status outside the closed set is reported as a conversion failure.
pub fn row_to_advertisement(row: &Row<'_>) -> rusqlite::Result<Advertisement> {
    let status: String = row.get(4)?;
    let status = status
        .parse::<AdStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Advertisement {
        id: row.get(0)?,
        title: row.get(1)?,
        image_url: row.get(2)?,
        placement: row.get(3)?,
        status,
        created_at: row.get(5)?,
        expires_at: row.get(6)?,
    })
}
