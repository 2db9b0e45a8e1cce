//! The rule record store: persisted rule definitions, parameters,
//! activations, and the repository display catalog.
//!
//! A synchronization pass exclusively owns the store, so write methods take
//! `&mut self`. Writes open a deferred transaction lazily; [`RuleStore::commit`]
//! closes it. A store dropped with an open batch rolls the batch back, which
//! is what bounds redo work after a crash mid-pass.

use chrono::Utc;

use lintel_core::entities::{ActiveRule, ActiveRuleParam, QualityProfile, RepoMeta, RuleDef, RuleParam};
use lintel_core::enums::Severity;
use lintel_core::ids::{PREFIX_ACTIVE_RULE, PREFIX_PROFILE, PREFIX_RULE};
use lintel_core::key::RuleKey;

use crate::LintelDb;
use crate::error::StoreError;
use crate::helpers::{
    get_opt_enum, get_opt_string, parse_datetime, parse_enum, tags_from_json, tags_to_json,
};

const RULE_COLS: &str = "id, repo_key, rule_key, name, description, description_format, \
     config_key, severity, status, is_template, template_id, language, remediation_fn, \
     remediation_gap_multiplier, remediation_base_effort, gap_description, system_tags, \
     rule_type, created_at, updated_at";

const PARAM_COLS: &str = "rule_id, name, kind, default_value, description";

const ACTIVE_COLS: &str = "id, profile_id, rule_id, severity, created_at, updated_at";

fn row_to_rule(row: &libsql::Row) -> Result<RuleDef, StoreError> {
    Ok(RuleDef {
        id: row.get(0)?,
        repo_key: row.get(1)?,
        rule_key: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        description_format: parse_enum(&row.get::<String>(5)?)?,
        config_key: get_opt_string(row, 6)?,
        severity: parse_enum(&row.get::<String>(7)?)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        is_template: row.get::<i64>(9)? != 0,
        template_id: get_opt_string(row, 10)?,
        language: get_opt_string(row, 11)?,
        remediation_fn: get_opt_enum(row, 12)?,
        remediation_gap_multiplier: get_opt_string(row, 13)?,
        remediation_base_effort: get_opt_string(row, 14)?,
        gap_description: get_opt_string(row, 15)?,
        system_tags: tags_from_json(&row.get::<String>(16)?)?,
        rule_type: parse_enum(&row.get::<String>(17)?)?,
        created_at: parse_datetime(&row.get::<String>(18)?)?,
        updated_at: parse_datetime(&row.get::<String>(19)?)?,
    })
}

fn row_to_param(row: &libsql::Row) -> Result<RuleParam, StoreError> {
    Ok(RuleParam {
        rule_id: row.get(0)?,
        name: row.get(1)?,
        kind: parse_enum(&row.get::<String>(2)?)?,
        default_value: get_opt_string(row, 3)?,
        description: get_opt_string(row, 4)?,
    })
}

fn row_to_active(row: &libsql::Row) -> Result<ActiveRule, StoreError> {
    Ok(ActiveRule {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        rule_id: row.get(2)?,
        severity: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Read/write access to persisted rule state with explicit commit
/// checkpoints.
pub struct RuleStore {
    db: LintelDb,
    in_batch: bool,
}

impl RuleStore {
    /// Open a store over a local database file (`":memory:"` for tests).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrations
    /// fail.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let db = LintelDb::open_local(path).await?;
        Ok(Self::from_db(db))
    }

    /// Wrap an already-open database handle.
    #[must_use]
    pub const fn from_db(db: LintelDb) -> Self {
        Self {
            db,
            in_batch: false,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &LintelDb {
        &self.db
    }

    /// Whether an uncommitted write batch is open.
    #[must_use]
    pub const fn in_batch(&self) -> bool {
        self.in_batch
    }

    /// Open a deferred transaction before the first write of a batch.
    async fn begin_batch(&mut self) -> Result<(), StoreError> {
        if !self.in_batch {
            self.db.conn().execute("BEGIN", ()).await?;
            self.in_batch = true;
        }
        Ok(())
    }

    /// Commit the open write batch, if any.
    ///
    /// Checkpoints durability; reads within a batch already see its writes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails.
    pub async fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_batch {
            self.db.conn().execute("COMMIT", ()).await?;
            self.in_batch = false;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Rule definitions
    // -----------------------------------------------------------------

    /// Load every persisted rule definition, removed ones included.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_all_definitions(&self) -> Result<Vec<RuleDef>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                &format!("SELECT {RULE_COLS} FROM rules ORDER BY repo_key, rule_key"),
                (),
            )
            .await?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next().await? {
            rules.push(row_to_rule(&row)?);
        }
        Ok(rules)
    }

    /// Look up a rule definition by surrogate id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_definition_by_id(&self, id: &str) -> Result<Option<RuleDef>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(&format!("SELECT {RULE_COLS} FROM rules WHERE id = ?1"), [id])
            .await?;
        rows.next().await?.as_ref().map(row_to_rule).transpose()
    }

    /// Look up a rule definition by natural key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_definition_by_key(
        &self,
        key: &RuleKey,
    ) -> Result<Option<RuleDef>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                &format!("SELECT {RULE_COLS} FROM rules WHERE repo_key = ?1 AND rule_key = ?2"),
                libsql::params![key.repository.as_str(), key.rule.as_str()],
            )
            .await?;
        rows.next().await?.as_ref().map(row_to_rule).transpose()
    }

    /// Insert a new rule definition row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on constraint violation or I/O failure.
    pub async fn insert_rule(&mut self, rule: &RuleDef) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "INSERT INTO rules (id, repo_key, rule_key, name, description, description_format, \
                 config_key, severity, status, is_template, template_id, language, remediation_fn, \
                 remediation_gap_multiplier, remediation_base_effort, gap_description, system_tags, \
                 rule_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                libsql::params![
                    rule.id.as_str(),
                    rule.repo_key.as_str(),
                    rule.rule_key.as_str(),
                    rule.name.as_str(),
                    rule.description.as_str(),
                    rule.description_format.as_str(),
                    rule.config_key.as_deref(),
                    rule.severity.as_str(),
                    rule.status.as_str(),
                    i64::from(rule.is_template),
                    rule.template_id.as_deref(),
                    rule.language.as_deref(),
                    rule.remediation_fn.map(|f| f.as_str()),
                    rule.remediation_gap_multiplier.as_deref(),
                    rule.remediation_base_effort.as_deref(),
                    rule.gap_description.as_deref(),
                    tags_to_json(&rule.system_tags),
                    rule.rule_type.as_str(),
                    rule.created_at.to_rfc3339(),
                    rule.updated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Write back every mutable field of a rule definition, keyed by id.
    ///
    /// Returns the number of affected rows so the caller can detect a rule
    /// that vanished mid-pass.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn update_rule(&mut self, rule: &RuleDef) -> Result<u64, StoreError> {
        self.begin_batch().await?;
        let affected = self
            .db
            .conn()
            .execute(
                "UPDATE rules SET name = ?2, description = ?3, description_format = ?4, \
                 config_key = ?5, severity = ?6, status = ?7, is_template = ?8, template_id = ?9, \
                 language = ?10, remediation_fn = ?11, remediation_gap_multiplier = ?12, \
                 remediation_base_effort = ?13, gap_description = ?14, system_tags = ?15, \
                 rule_type = ?16, updated_at = ?17
                 WHERE id = ?1",
                libsql::params![
                    rule.id.as_str(),
                    rule.name.as_str(),
                    rule.description.as_str(),
                    rule.description_format.as_str(),
                    rule.config_key.as_deref(),
                    rule.severity.as_str(),
                    rule.status.as_str(),
                    i64::from(rule.is_template),
                    rule.template_id.as_deref(),
                    rule.language.as_deref(),
                    rule.remediation_fn.map(|f| f.as_str()),
                    rule.remediation_gap_multiplier.as_deref(),
                    rule.remediation_base_effort.as_deref(),
                    rule.gap_description.as_deref(),
                    tags_to_json(&rule.system_tags),
                    rule.rule_type.as_str(),
                    rule.updated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(affected)
    }

    // -----------------------------------------------------------------
    // Rule parameters
    // -----------------------------------------------------------------

    /// Parameters of the rule with the given natural key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_params_by_rule_key(
        &self,
        key: &RuleKey,
    ) -> Result<Vec<RuleParam>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                "SELECT p.rule_id, p.name, p.kind, p.default_value, p.description
                 FROM rule_params p
                 JOIN rules r ON r.id = p.rule_id
                 WHERE r.repo_key = ?1 AND r.rule_key = ?2
                 ORDER BY p.name",
                libsql::params![key.repository.as_str(), key.rule.as_str()],
            )
            .await?;
        let mut params = Vec::new();
        while let Some(row) = rows.next().await? {
            params.push(row_to_param(&row)?);
        }
        Ok(params)
    }

    /// Insert a rule parameter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on constraint violation or I/O failure.
    pub async fn insert_param(&mut self, param: &RuleParam) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "INSERT INTO rule_params (rule_id, name, kind, default_value, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    param.rule_id.as_str(),
                    param.name.as_str(),
                    param.kind.as_str(),
                    param.default_value.as_deref(),
                    param.description.as_deref()
                ],
            )
            .await?;
        Ok(())
    }

    /// Update a rule parameter's kind, default, and description.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn update_param(&mut self, param: &RuleParam) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "UPDATE rule_params SET kind = ?3, default_value = ?4, description = ?5
                 WHERE rule_id = ?1 AND name = ?2",
                libsql::params![
                    param.rule_id.as_str(),
                    param.name.as_str(),
                    param.kind.as_str(),
                    param.default_value.as_deref(),
                    param.description.as_deref()
                ],
            )
            .await?;
        Ok(())
    }

    /// Delete a rule parameter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn delete_param(&mut self, rule_id: &str, name: &str) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "DELETE FROM rule_params WHERE rule_id = ?1 AND name = ?2",
                libsql::params![rule_id, name],
            )
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Active rules and overrides
    // -----------------------------------------------------------------

    /// Activations of a rule across all quality profiles.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_active_rules_by_rule_id(
        &self,
        rule_id: &str,
    ) -> Result<Vec<ActiveRule>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                &format!("SELECT {ACTIVE_COLS} FROM active_rules WHERE rule_id = ?1 ORDER BY id"),
                [rule_id],
            )
            .await?;
        let mut actives = Vec::new();
        while let Some(row) = rows.next().await? {
            actives.push(row_to_active(&row)?);
        }
        Ok(actives)
    }

    /// Parameter overrides carried by one activation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_active_params(
        &self,
        active_rule_id: &str,
    ) -> Result<Vec<ActiveRuleParam>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                "SELECT active_rule_id, name, value FROM active_rule_params
                 WHERE active_rule_id = ?1 ORDER BY name",
                [active_rule_id],
            )
            .await?;
        let mut params = Vec::new();
        while let Some(row) = rows.next().await? {
            params.push(ActiveRuleParam {
                active_rule_id: row.get(0)?,
                name: row.get(1)?,
                value: row.get(2)?,
            });
        }
        Ok(params)
    }

    /// Record a parameter override on an activation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on constraint violation or I/O failure.
    pub async fn insert_active_param_override(
        &mut self,
        active_rule_id: &str,
        param_name: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "INSERT INTO active_rule_params (active_rule_id, name, value)
                 VALUES (?1, ?2, ?3)",
                libsql::params![active_rule_id, param_name, value],
            )
            .await?;
        Ok(())
    }

    /// Delete every per-activation override of one rule parameter, across
    /// all profiles.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn delete_active_param_overrides(
        &mut self,
        rule_id: &str,
        param_name: &str,
    ) -> Result<u64, StoreError> {
        self.begin_batch().await?;
        let affected = self
            .db
            .conn()
            .execute(
                "DELETE FROM active_rule_params
                 WHERE name = ?2
                   AND active_rule_id IN (SELECT id FROM active_rules WHERE rule_id = ?1)",
                libsql::params![rule_id, param_name],
            )
            .await?;
        Ok(affected)
    }

    /// Remove every activation of a rule and return the rows that were
    /// deleted (their overrides go with them via FK cascade).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn deactivate_rule(&mut self, rule_id: &str) -> Result<Vec<ActiveRule>, StoreError> {
        let actives = self.select_active_rules_by_rule_id(rule_id).await?;
        if actives.is_empty() {
            return Ok(actives);
        }
        self.begin_batch().await?;
        self.db
            .conn()
            .execute("DELETE FROM active_rules WHERE rule_id = ?1", [rule_id])
            .await?;
        Ok(actives)
    }

    // -----------------------------------------------------------------
    // Repository catalog
    // -----------------------------------------------------------------

    /// Drop the persisted repository listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn truncate_repositories(&mut self) -> Result<(), StoreError> {
        self.begin_batch().await?;
        self.db
            .conn()
            .execute("DELETE FROM rule_repositories", ())
            .await?;
        Ok(())
    }

    /// Bulk-insert the declared repository listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on constraint violation or I/O failure.
    pub async fn insert_repositories(&mut self, repos: &[RepoMeta]) -> Result<(), StoreError> {
        self.begin_batch().await?;
        for repo in repos {
            self.db
                .conn()
                .execute(
                    "INSERT INTO rule_repositories (key, language, name) VALUES (?1, ?2, ?3)",
                    libsql::params![repo.key.as_str(), repo.language.as_str(), repo.name.as_str()],
                )
                .await?;
        }
        Ok(())
    }

    /// The persisted repository listing, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query or row decoding fails.
    pub async fn select_repositories(&self) -> Result<Vec<RepoMeta>, StoreError> {
        let mut rows = self
            .db
            .conn()
            .query(
                "SELECT key, language, name FROM rule_repositories ORDER BY key",
                (),
            )
            .await?;
        let mut repos = Vec::new();
        while let Some(row) = rows.next().await? {
            repos.push(RepoMeta {
                key: row.get(0)?,
                language: row.get(1)?,
                name: row.get(2)?,
            });
        }
        Ok(repos)
    }

    // -----------------------------------------------------------------
    // Profile seeding (used by tests and operational tooling)
    // -----------------------------------------------------------------

    /// Create a quality profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on I/O failure.
    pub async fn create_profile(
        &mut self,
        name: &str,
        language: &str,
    ) -> Result<QualityProfile, StoreError> {
        let now = Utc::now();
        let id = self.db.generate_id(PREFIX_PROFILE).await?;
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "INSERT INTO quality_profiles (id, name, language, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name, language, now.to_rfc3339()],
            )
            .await?;
        Ok(QualityProfile {
            id,
            name: name.to_string(),
            language: language.to_string(),
            created_at: now,
        })
    }

    /// Switch a rule on in a profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on constraint violation or I/O failure.
    pub async fn activate_rule(
        &mut self,
        profile_id: &str,
        rule_id: &str,
        severity: Severity,
    ) -> Result<ActiveRule, StoreError> {
        let now = Utc::now();
        let id = self.db.generate_id(PREFIX_ACTIVE_RULE).await?;
        self.begin_batch().await?;
        self.db
            .conn()
            .execute(
                "INSERT INTO active_rules (id, profile_id, rule_id, severity, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    profile_id,
                    rule_id,
                    severity.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        Ok(ActiveRule {
            id,
            profile_id: profile_id.to_string(),
            rule_id: rule_id.to_string(),
            severity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Generate a fresh rule id (used by the sync pass on create).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if id generation fails.
    pub async fn next_rule_id(&self) -> Result<String, StoreError> {
        self.db.generate_id(PREFIX_RULE).await
    }
}
