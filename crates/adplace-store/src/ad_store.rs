//! `AdStore`: one transactional session per operation
//!
//! Callers that need several operations to commit together use `begin` and
//! the free functions in `repo` on the returned `Session` instead.

use adplace_core::model::{unix_now, Advertisement};
use adplace_core::queries::{SelectAdsArgs, UpdateAdsArgs};

use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::errors::Result;
use crate::migrations::apply_migrations;
use crate::pool::ConnectionPool;
use crate::repo;
use crate::session::{Session, SessionMode};

#[derive(Clone)]
pub struct AdStore {
    pool: ConnectionPool,
}

impl AdStore {
    /// Build the pool and bring the schema up to date
    ///
    /// # Errors
    ///
    /// Storage error for an invalid configuration, an unopenable database or
    /// a failed migration.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let pool = ConnectionPool::new(config)?;
        {
            let mut conn = pool.acquire(&OpContext::background())?;
            apply_migrations(&mut conn)?;
        }
        tracing::debug!(path = %pool.config().path.display(), "ad store opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// # Errors
    ///
    /// See [`Session::begin`].
    pub fn begin(&self, ctx: &OpContext, mode: SessionMode) -> Result<Session> {
        Session::begin(&self.pool, ctx, mode)
    }

    /// # Errors
    ///
    /// Storage error on a duplicate id, constraint violation or transport
    /// failure; nothing is written in that case.
    pub fn insert(&self, ctx: &OpContext, ad: &Advertisement) -> Result<()> {
        let session = self.begin(ctx, SessionMode::ReadWrite)?;
        repo::insert_ad(&session, ad)?;
        session.commit()
    }

    /// # Errors
    ///
    /// `QueryBuild` or `Storage`; see [`repo::select_ads_at`].
    pub fn select(&self, ctx: &OpContext, args: &SelectAdsArgs) -> Result<Vec<Advertisement>> {
        self.select_at(ctx, args, unix_now())
    }

    /// Select with an explicit expiration reference time
    ///
    /// # Errors
    ///
    /// `QueryBuild` or `Storage`; see [`repo::select_ads_at`].
    pub fn select_at(
        &self,
        ctx: &OpContext,
        args: &SelectAdsArgs,
        now: i64,
    ) -> Result<Vec<Advertisement>> {
        let session = self.begin(ctx, SessionMode::ReadOnly)?;
        let ads = repo::select_ads_at(&session, args, now)?;
        session.commit()?;
        Ok(ads)
    }

    /// # Errors
    ///
    /// `Validation` for an empty id, `NotFound` for an unknown one.
    pub fn get(&self, ctx: &OpContext, id: &str) -> Result<Advertisement> {
        let session = self.begin(ctx, SessionMode::ReadOnly)?;
        let ad = repo::get_ad(&session, id)?;
        session.commit()?;
        Ok(ad)
    }

    /// # Errors
    ///
    /// `Validation`, `NotFound` or `Storage`; see [`repo::update_ads`]. A
    /// failed update leaves the record untouched.
    pub fn update(&self, ctx: &OpContext, args: &UpdateAdsArgs) -> Result<()> {
        let session = self.begin(ctx, SessionMode::ReadWrite)?;
        repo::update_ads(&session, args)?;
        session.commit()
    }
}
