//! Account and assessment workflow on top of a [`RecordStore`].

use thiserror::Error;
use tracing::{info, warn};

use tax_core::calculations::{Assessment, AssessmentError, ReliefClaim, TaxAssessor};
use tax_core::store::MemoryStoreFactory;
use tax_core::{
    IcNumber, IcNumberError, RecordStore, ReliefCategory, StoreError, StoreRegistry, TaxRecord,
    TaxYearConfig,
};
use tax_records_csv::CsvRecordStoreFactory;
use tax_records_sqlite::SqliteRecordStoreFactory;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("user ID cannot be empty")]
    EmptyUserId,

    #[error("user ID '{0}' already exists")]
    UserExists(String),

    #[error(transparent)]
    InvalidIc(#[from] IcNumberError),

    #[error("password must be the last 4 digits of the IC number")]
    PasswordMismatch,

    #[error("user ID '{0}' not found")]
    UnknownUser(String),

    #[error("incorrect password")]
    WrongPassword,

    #[error(transparent)]
    Assessment(#[from] AssessmentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A registry with every backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry.register(Box::new(CsvRecordStoreFactory));
    registry.register(Box::new(SqliteRecordStoreFactory));
    registry
}

/// Yes/no answers that grant a relief at its full table amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Circumstances {
    pub disabled: bool,
    pub spouse_not_working: bool,
    pub spouse_disabled: bool,
}

/// An assessment together with the record it was saved into.
#[derive(Debug, Clone)]
pub struct Calculation {
    pub record: TaxRecord,
    pub assessment: Assessment,
}

pub struct TaxApp {
    store: Box<dyn RecordStore>,
    config: TaxYearConfig,
}

impl TaxApp {
    pub fn new(
        store: Box<dyn RecordStore>,
        config: TaxYearConfig,
    ) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &TaxYearConfig {
        &self.config
    }

    /// Creates an account with every figure at zero.
    ///
    /// The password is not stored; it must match the last four digits of
    /// the IC number.
    pub async fn register(
        &self,
        user_id: &str,
        ic_number: &str,
        password: &str,
    ) -> Result<TaxRecord, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::EmptyUserId);
        }
        if self.store.exists(user_id).await? {
            return Err(AppError::UserExists(user_id.to_string()));
        }

        let ic_number = IcNumber::parse(ic_number)?;
        if !ic_number.verify_password(password) {
            return Err(AppError::PasswordMismatch);
        }

        let record = TaxRecord::register(user_id, ic_number);
        self.store.insert(&record).await.map_err(|e| match e {
            StoreError::Duplicate(id) => AppError::UserExists(id),
            other => AppError::Store(other),
        })?;

        info!(user_id, "user registered");
        Ok(record)
    }

    pub async fn login(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<TaxRecord, AppError> {
        let user_id = user_id.trim();
        let record = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::UnknownUser(user_id.to_string()))?;

        if !record.ic_number.verify_password(password) {
            warn!(user_id, "login rejected");
            return Err(AppError::WrongPassword);
        }
        Ok(record)
    }

    /// The claims every calculation starts from: the individual relief,
    /// plus each relief `circumstances` answers yes to. A category missing
    /// from the year's table is skipped.
    pub fn automatic_claims(
        &self,
        circumstances: Circumstances,
    ) -> Vec<ReliefClaim> {
        let limits = self.config.relief_limits();
        let answers = [
            (true, ReliefCategory::Individual),
            (circumstances.disabled, ReliefCategory::IndividualDisabled),
            (circumstances.spouse_not_working, ReliefCategory::Spouse),
            (circumstances.spouse_disabled, ReliefCategory::SpouseDisabled),
        ];

        answers
            .into_iter()
            .filter(|(yes, _)| *yes)
            .filter_map(|(_, category)| {
                limits
                    .amount(category)
                    .map(|amount| ReliefClaim::new(category, amount.to_string()))
            })
            .collect()
    }

    /// Logs in, assesses `income` against `claims`, and saves the result
    /// over the user's record.
    pub async fn calculate(
        &self,
        user_id: &str,
        password: &str,
        income: &str,
        claims: &[ReliefClaim],
    ) -> Result<Calculation, AppError> {
        let mut record = self.login(user_id, password).await?;

        let assessment = TaxAssessor::new(&self.config).assess_raw(income, claims)?;
        assessment.apply_to(&mut record);

        match self.store.update(&record.user_id, &record).await {
            Err(StoreError::NotFound(_)) => self.store.insert(&record).await?,
            other => other?,
        }

        Ok(Calculation { record, assessment })
    }

    pub async fn record(
        &self,
        user_id: &str,
    ) -> Result<TaxRecord, AppError> {
        let user_id = user_id.trim();
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::UnknownUser(user_id.to_string()))
    }

    pub async fn records(&self) -> Result<Vec<TaxRecord>, AppError> {
        Ok(self.store.list_all().await?)
    }
}
