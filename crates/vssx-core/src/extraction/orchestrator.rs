//! Extraction orchestrator.
//!
//! Runs the strategy chain for every requested field, then normalizes,
//! validates, scores and cross-validates the winning candidate. Everything
//! that goes wrong for a single field ends up inside that field's
//! [`ExtractionResult`]; only document construction can fail as a whole.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use super::cross::CrossValidator;
use super::rules::{NormalizationTables, RuleSet};
use super::scoring::{NormalizationOutcome, QualityScorer};
use super::strategies::{StrategyChain, StrategyContext};
use crate::document::{Document, DocumentProfile};
use crate::error::{DocumentError, ExtractionError};
use crate::models::{
    CrossValidation, ExtractionConfig, ExtractionReport, ExtractionResult, KnownValues,
    ScoringConfig, ValidationConfig, VssxConfig,
};
use crate::registry::{FieldSpec, PatternRegistry};

/// Drives field extraction over documents.
///
/// The orchestrator holds only read-only state and can be shared across
/// threads.
#[derive(Debug)]
pub struct ExtractionOrchestrator {
    registry: Arc<PatternRegistry>,
    tables: Arc<NormalizationTables>,
    extraction: ExtractionConfig,
    validation: ValidationConfig,
    scorer: QualityScorer,
    scoring: ScoringConfig,
    cross: CrossValidator,
    chain: StrategyChain,
}

impl ExtractionOrchestrator {
    /// Orchestrator with the built-in registry, tables and settings.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(PatternRegistry::default()),
            Arc::new(NormalizationTables::builtin()),
            VssxConfig::default(),
        )
    }

    /// Orchestrator built from configuration.
    ///
    /// Fails when a value is out of range or a pattern override does not
    /// compile.
    pub fn from_config(config: VssxConfig) -> crate::Result<Self> {
        config.validate()?;
        let registry = PatternRegistry::from_config(&config)?;
        let tables = NormalizationTables::with_overrides(&config.tables);
        Ok(Self::with_parts(Arc::new(registry), Arc::new(tables), config))
    }

    fn with_parts(
        registry: Arc<PatternRegistry>,
        tables: Arc<NormalizationTables>,
        config: VssxConfig,
    ) -> Self {
        Self {
            registry,
            tables,
            scorer: QualityScorer::new(config.scoring.clone()),
            cross: CrossValidator::new(config.scoring.consistency_threshold),
            scoring: config.scoring,
            extraction: config.extraction,
            validation: config.validation,
            chain: StrategyChain::default(),
        }
    }

    /// Use a different pattern registry.
    pub fn with_registry(mut self, registry: Arc<PatternRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use different normalization tables.
    pub fn with_tables(mut self, tables: Arc<NormalizationTables>) -> Self {
        self.tables = tables;
        self
    }

    /// Set scoring configuration.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scorer = QualityScorer::new(scoring.clone());
        self.cross = CrossValidator::new(scoring.consistency_threshold);
        self.scoring = scoring;
        self
    }

    /// Set validation limits.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Set document and strategy settings.
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Use a custom strategy chain.
    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn tables(&self) -> &NormalizationTables {
        &self.tables
    }

    /// Fields extracted when the caller names none.
    pub fn default_fields(&self) -> Vec<&str> {
        self.extraction
            .default_fields
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn rules(&self) -> RuleSet<'_> {
        RuleSet::new(&self.tables, &self.validation)
    }

    /// Extract the requested fields from a parsed document.
    ///
    /// The report holds exactly one result per requested field, in request
    /// order.
    pub fn extract(
        &self,
        document: &Document,
        fields: &[&str],
        known: Option<&KnownValues>,
    ) -> ExtractionReport {
        let start = Instant::now();
        let profile = DocumentProfile::analyze(document);
        debug!(
            "Document profile: {:?}, {} elements",
            profile.structure_type, profile.total_elements
        );

        let results: Vec<ExtractionResult> = fields
            .iter()
            .map(|name| match self.registry.get(name) {
                Some(spec) => self.extract_field(document, spec, known),
                None => {
                    debug!("Requested field is not registered: {}", name);
                    ExtractionResult::failed(
                        *name,
                        None,
                        ExtractionError::UnknownField(name.to_string()).to_string(),
                    )
                }
            })
            .collect();

        let report = ExtractionReport::new(results, profile);
        info!(
            "Extracted {}/{} fields (quality {:.2}, grade {}) in {}ms",
            report.summary.fields_succeeded,
            report.summary.fields_attempted,
            report.summary.overall_quality_score,
            report.summary.grade,
            start.elapsed().as_millis()
        );
        report
    }

    /// Extract every registered field.
    pub fn extract_all(
        &self,
        document: &Document,
        known: Option<&KnownValues>,
    ) -> ExtractionReport {
        let fields = self.registry.field_names();
        self.extract(document, &fields, known)
    }

    /// Parse HTML and extract the requested fields.
    pub fn extract_html(
        &self,
        html: &str,
        fields: &[&str],
        known: Option<&KnownValues>,
    ) -> Result<ExtractionReport, DocumentError> {
        let document = Document::parse_with_limit(html, self.extraction.max_document_bytes)?;
        Ok(self.extract(&document, fields, known))
    }

    /// Extract from many documents in parallel, preserving input order.
    pub fn extract_batch<S>(
        &self,
        documents: &[S],
        fields: &[&str],
    ) -> Vec<Result<ExtractionReport, DocumentError>>
    where
        S: AsRef<str> + Sync,
    {
        self.extract_batch_with_progress(documents, fields, || {})
    }

    /// Like [`Self::extract_batch`], calling `on_done` as each document
    /// finishes, from whichever worker thread ran it.
    pub fn extract_batch_with_progress<S, F>(
        &self,
        documents: &[S],
        fields: &[&str],
        on_done: F,
    ) -> Vec<Result<ExtractionReport, DocumentError>>
    where
        S: AsRef<str> + Sync,
        F: Fn() + Sync,
    {
        info!("Extracting {} documents", documents.len());
        documents
            .par_iter()
            .map(|html| {
                let outcome = self.extract_html(html.as_ref(), fields, None);
                on_done();
                outcome
            })
            .collect()
    }

    fn extract_field(
        &self,
        document: &Document,
        spec: &FieldSpec,
        known: Option<&KnownValues>,
    ) -> ExtractionResult {
        let rules = self.rules();
        let known_value = known.and_then(|k| spec.known_value(k));
        let ctx = StrategyContext {
            document,
            field: spec,
            rules,
            scoring: &self.scoring,
            extraction: &self.extraction,
        };

        let Some(candidate) = self.chain.run(&ctx) else {
            let mut result = ExtractionResult::failed(
                spec.name.as_str(),
                Some(spec.field_type),
                ExtractionError::NoCandidate(spec.name.clone()).to_string(),
            );
            result.cross_validation =
                self.cross.compare(&rules, spec.field_type, None, known_value);
            return result;
        };

        let normalized = rules.normalize(spec.field_type, &candidate.raw);
        let validation = normalized
            .value
            .as_ref()
            .map(|value| rules.validate(value))
            .unwrap_or_default();

        let outcome =
            NormalizationOutcome::from_parts(normalized.value.is_some(), normalized.notes.len());
        let (confidence, quality) = self.scorer.assess(
            candidate.confidence,
            candidate.fallback_used,
            validation.errors.len(),
            outcome,
        );

        let cross_validation = match known_value {
            Some(_) => self.cross.compare(
                &rules,
                spec.field_type,
                normalized.value.as_ref(),
                known_value,
            ),
            None => CrossValidation::NotApplicable,
        };

        debug!(
            "{}: {:?} via {} -> {:.2} ({})",
            spec.name, candidate.raw, candidate.strategy, confidence, quality
        );

        ExtractionResult {
            field_name: spec.name.clone(),
            field_type: Some(spec.field_type),
            raw_candidate: Some(candidate.raw),
            normalized_value: normalized.value,
            confidence_score: confidence,
            quality_level: quality,
            strategy_used: Some(candidate.strategy),
            fallback_used: candidate.fallback_used,
            validation_errors: validation.errors,
            validation_warnings: validation.warnings,
            normalization_notes: normalized.notes,
            cross_validation,
        }
    }
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, Member, QualityLevel, StrategyKind};
    use pretty_assertions::assert_eq;

    const TABLE_BASED: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Kết quả tra cứu</title></head>
        <body>
            <div class="content">
                <h2>Thông tin hộ</h2>
                <table class="info-table">
                    <tr><td class="label">Họ và tên:</td><td class="value">NGUYỄN VĂN ANH</td></tr>
                    <tr><td class="label">Ngày sinh:</td><td class="value">15/03/1985</td></tr>
                    <tr><td class="label">Điện thoại liên hệ:</td><td class="value">0912345678</td></tr>
                    <tr><td class="label">Thu nhập hàng tháng:</td><td class="value">25,500,000 VND</td></tr>
                    <tr><td class="label">Ngân hàng nhận lương:</td><td class="value">Vietcombank (VCB)</td></tr>
                    <tr><td class="label">Mã hộ gia đình:</td><td class="value">HGD202301234</td></tr>
                </table>

                <h3>Thành viên hộ gia đình</h3>
                <table class="family-table">
                    <thead>
                        <tr><th>Họ tên</th><th>Quan hệ</th><th>Năm sinh</th></tr>
                    </thead>
                    <tbody>
                        <tr><td>Trần Thị Bình</td><td>Vợ</td><td>1987</td></tr>
                        <tr><td>Nguyễn Văn Cường</td><td>Con</td><td>2015</td></tr>
                        <tr><td>Nguyễn Thị Dung</td><td>Con</td><td>2018</td></tr>
                    </tbody>
                </table>
            </div>
        </body>
        </html>
    "#;

    const DIV_BASED: &str = r#"
        <html>
        <body>
            <div class="profile-container">
                <div class="personal-info">
                    <div class="field" data-field="name">
                        <label>Họ tên:</label>
                        <span class="value">LÊ THỊ HOA</span>
                    </div>
                    <div class="field contact-info" data-field="phone">
                        <label>SĐT:</label>
                        <span class="phone-value">+84 987 654 321</span>
                    </div>
                    <div class="field income-info">
                        <label>Mức lương:</label>
                        <span class="salary">18 triệu VND/tháng</span>
                    </div>
                    <div class="banking-info">
                        <span class="bank-label">NH:</span>
                        <span class="bank-name">Techcombank</span>
                    </div>
                </div>
                <div class="household-section">
                    <div class="household-code">
                        <strong>Mã HGĐ: HGD456789012</strong>
                    </div>
                    <div class="family-members">
                        <h4>Thành viên gia đình</h4>
                        <div class="member">Phạm Văn Nam - Chồng - 1983</div>
                        <div class="member">Lê Văn Minh - Con - 2012</div>
                    </div>
                </div>
            </div>
        </body>
        </html>
    "#;

    const FORM_BASED: &str = r#"
        <html>
        <head>
            <script type="application/json" id="user-data">
            {"citizen_info": {"phone": "0999999999", "bank_code": "VCB"}}
            </script>
        </head>
        <body>
            <form class="citizen-form">
                <div class="form-group">
                    <label>Điện thoại:</label>
                    <input type="tel" name="phone" value="0123456789" readonly>
                </div>
                <div class="form-group">
                    <label>Thu nhập:</label>
                    <input type="text" name="income" value="30,000,000 VNĐ" readonly>
                </div>
                <div class="form-group">
                    <label>Ngân hàng:</label>
                    <select name="bank" disabled>
                        <option value="">-- Chọn ngân hàng --</option>
                        <option value="ACB" selected>Á Châu (ACB)</option>
                        <option value="VCB">Vietcombank</option>
                    </select>
                </div>
                <div class="household-info">
                    <p>Mã hộ: <strong>HGD789012345</strong></p>
                    <div class="members">
                        <p>Vợ: Nguyễn Thị Lan (1990)</p>
                        <p>Con: Hoàng Văn Quang (2016)</p>
                    </div>
                </div>
            </form>
        </body>
        </html>
    "#;

    const COMPLEX_MIXED: &str = r#"
        <html>
        <body>
            <div id="citizen-header">
                <h1>Tra cứu: PHAN THỊ MAI</h1>
                <p class="contact-info">Liên hệ: 0908.123.456 | Email: mai@example.com</p>
            </div>
            <div class="household-footer">
                <div class="hgd-info">
                    <span class="label">Hộ gia đình:</span>
                    <span class="code">HGD567890123</span>
                </div>
                <div class="family-text">
                    Thành viên: Lê Văn Tuấn (Chồng, 1982), Phan Thị Oanh (Con, 2014), Phan Văn Tùng (Con, 2017)
                </div>
            </div>
        </body>
        </html>
    "#;

    const MINIMAL: &str = r#"
        <html>
        <body>
            <p>TRẦN VĂN BÌNH - SĐT: 0932.111.222</p>
            <p>Lương: 18000000 VND, Bank: VIB</p>
            <p>HGD012345678</p>
            <p>Gia đình: Vợ - Nguyễn Thị Cẩm, Con - Trần Minh Khôi (2019)</p>
        </body>
        </html>
    "#;

    fn member(name: &str, relationship: &str, birth_year: Option<u16>) -> Member {
        Member {
            name: name.to_string(),
            relationship: Some(relationship.to_string()),
            birth_year,
        }
    }

    fn phone(value: &str) -> FieldValue {
        FieldValue::Phone(value.to_string())
    }

    fn income(amount: i64) -> FieldValue {
        FieldValue::Income {
            amount,
            currency: "VND".to_string(),
        }
    }

    fn bank(code: &str, full_name: &str) -> FieldValue {
        FieldValue::Bank {
            code: code.to_string(),
            full_name: full_name.to_string(),
        }
    }

    fn code(value: &str) -> FieldValue {
        FieldValue::Code(value.to_string())
    }

    fn extract_all(html: &str) -> ExtractionReport {
        let orchestrator = ExtractionOrchestrator::new();
        let document = Document::parse(html).unwrap();
        orchestrator.extract_all(&document, None)
    }

    #[test]
    fn test_table_based_document() {
        let report = extract_all(TABLE_BASED);
        assert_eq!(report.value("phone"), Some(&phone("0912345678")));
        assert_eq!(report.value("income"), Some(&income(25_500_000)));
        assert_eq!(report.value("bank"), Some(&bank("VCB", "Vietcombank")));
        assert_eq!(report.value("household_code"), Some(&code("HGD202301234")));
        assert_eq!(
            report.value("members"),
            Some(&FieldValue::Members(vec![
                member("Trần Thị Bình", "Vợ", Some(1987)),
                member("Nguyễn Văn Cường", "Con", Some(2015)),
                member("Nguyễn Thị Dung", "Con", Some(2018)),
            ]))
        );

        for result in &report.results {
            assert_eq!(
                result.strategy_used,
                Some(StrategyKind::Structural),
                "{}",
                result.field_name
            );
            assert_eq!(result.quality_level, QualityLevel::Excellent, "{}", result.field_name);
        }
        assert_eq!(report.summary.fields_succeeded, 5);
        assert_eq!(report.summary.overall_success_rate, 1.0);
    }

    #[test]
    fn test_div_based_document() {
        let report = extract_all(DIV_BASED);
        assert_eq!(report.value("phone"), Some(&phone("0987654321")));
        assert_eq!(report.value("income"), Some(&income(18_000_000)));
        assert_eq!(report.value("bank"), Some(&bank("TCB", "Techcombank")));
        assert_eq!(report.value("household_code"), Some(&code("HGD456789012")));
        assert_eq!(
            report.value("members"),
            Some(&FieldValue::Members(vec![
                member("Phạm Văn Nam", "Chồng", Some(1983)),
                member("Lê Văn Minh", "Con", Some(2012)),
            ]))
        );
        assert_eq!(
            report.get("household_code").unwrap().strategy_used,
            Some(StrategyKind::Regex)
        );
    }

    #[test]
    fn test_form_based_document_ignores_script_data() {
        let report = extract_all(FORM_BASED);
        assert_eq!(report.value("phone"), Some(&phone("0123456789")));
        assert_eq!(report.value("income"), Some(&income(30_000_000)));
        assert_eq!(report.value("bank"), Some(&bank("ACB", "Asia Commercial Bank")));
        assert_eq!(report.value("household_code"), Some(&code("HGD789012345")));
        assert_eq!(
            report.value("members"),
            Some(&FieldValue::Members(vec![
                member("Nguyễn Thị Lan", "Vợ", Some(1990)),
                member("Hoàng Văn Quang", "Con", Some(2016)),
            ]))
        );
        assert!(report.profile.has_json_script);
    }

    #[test]
    fn test_complex_mixed_document() {
        let report = extract_all(COMPLEX_MIXED);
        assert_eq!(report.value("phone"), Some(&phone("0908123456")));
        assert_eq!(report.value("household_code"), Some(&code("HGD567890123")));
        assert_eq!(
            report.value("members"),
            Some(&FieldValue::Members(vec![
                member("Lê Văn Tuấn", "Chồng", Some(1982)),
                member("Phan Thị Oanh", "Con", Some(2014)),
                member("Phan Văn Tùng", "Con", Some(2017)),
            ]))
        );
    }

    #[test]
    fn test_minimal_document() {
        let report = extract_all(MINIMAL);
        assert_eq!(report.value("phone"), Some(&phone("0932111222")));
        assert_eq!(report.value("income"), Some(&income(18_000_000)));
        assert_eq!(report.value("bank"), Some(&bank("VIB", "Vietnam International Bank")));
        assert_eq!(report.value("household_code"), Some(&code("HGD012345678")));
        assert_eq!(
            report.value("members"),
            Some(&FieldValue::Members(vec![
                member("Nguyễn Thị Cẩm", "Vợ", None),
                member("Trần Minh Khôi", "Con", Some(2019)),
            ]))
        );
        for result in &report.results {
            assert_eq!(result.strategy_used, Some(StrategyKind::Regex), "{}", result.field_name);
        }
    }

    #[test]
    fn test_table_row_phone_is_good() {
        let html = "<table><tr><td>Điện thoại</td><td>0912.345.678</td></tr></table>";
        let report = extract_all(html);
        let result = report.get("phone").unwrap();
        assert_eq!(result.normalized_value, Some(phone("0912345678")));
        assert!(result.quality_level >= QualityLevel::Good);
        assert_eq!(result.raw_candidate.as_deref(), Some("0912.345.678"));
    }

    #[test]
    fn test_income_with_multiplier() {
        let report = extract_all("<p>Thu nhập: 18 triệu đồng</p>");
        assert_eq!(report.value("income"), Some(&income(18_000_000)));
    }

    #[test]
    fn test_bank_code_lookup() {
        let report = extract_all("<p>Ngân hàng: VCB</p>");
        assert_eq!(report.value("bank"), Some(&bank("VCB", "Vietcombank")));
    }

    #[test]
    fn test_missing_phone_fails() {
        let report = extract_all("<p>Họ tên: Nguyễn Văn An</p><p>Thu nhập: 18 triệu đồng</p>");
        let result = report.get("phone").unwrap();
        assert_eq!(result.quality_level, QualityLevel::Failed);
        assert_eq!(result.normalized_value, None);
        assert_eq!(result.raw_candidate, None);
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.validation_errors, vec!["no candidate found for phone".to_string()]);
    }

    #[test]
    fn test_household_code_is_compacted() {
        let report = extract_all("<p>Mã hộ: hgd 123456789</p>");
        assert_eq!(report.value("household_code"), Some(&code("HGD123456789")));
    }

    #[test]
    fn test_known_phone_cross_validation() {
        let orchestrator = ExtractionOrchestrator::new();
        let mut known = KnownValues::new();
        known.insert("phone".to_string(), "0912345678".to_string());
        known.insert("ma_ho".to_string(), "HGD123456789".to_string());

        let html = "<table><tr><td>Điện thoại</td><td>0912.345.678</td></tr></table>";
        let report = orchestrator
            .extract_html(html, &["phone", "household_code", "bank"], Some(&known))
            .unwrap();

        assert_eq!(
            report.get("phone").unwrap().cross_validation,
            CrossValidation::Compared {
                similarity: 1.0,
                consistent: true,
                known: "0912345678".to_string(),
            }
        );
        assert_eq!(
            report.get("household_code").unwrap().cross_validation.similarity(),
            Some(0.0)
        );
        assert_eq!(report.get("bank").unwrap().cross_validation, CrossValidation::NotApplicable);
        assert_eq!(report.get("phone").unwrap().confidence_score, 1.0);
        assert_eq!(report.summary.overall_consistency, Some(0.5));
    }

    #[test]
    fn test_unknown_field_yields_failed_result() {
        let orchestrator = ExtractionOrchestrator::new();
        let report = orchestrator
            .extract_html("<p>SĐT: 0912345678</p>", &["email", "phone"], None)
            .unwrap();
        assert_eq!(report.results.len(), 2);
        let email = &report.results[0];
        assert_eq!(email.field_name, "email");
        assert_eq!(email.field_type, None);
        assert_eq!(email.quality_level, QualityLevel::Failed);
        assert_eq!(email.validation_errors, vec!["field not registered: email".to_string()]);
        assert_eq!(report.results[1].field_name, "phone");
        assert_eq!(report.summary.fields_attempted, 2);
        assert_eq!(report.summary.fields_succeeded, 1);
    }

    #[test]
    fn test_results_follow_request_order() {
        let orchestrator = ExtractionOrchestrator::new();
        let fields = ["members", "phone", "members"];
        let report = orchestrator.extract_html(MINIMAL, &fields, None).unwrap();
        let names: Vec<&str> = report.results.iter().map(|r| r.field_name.as_str()).collect();
        assert_eq!(names, fields.to_vec());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let orchestrator = ExtractionOrchestrator::new();
        let document = Document::parse(COMPLEX_MIXED).unwrap();
        let first = orchestrator.extract_all(&document, None);
        let second = orchestrator.extract_all(&document, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_document_errors_surface() {
        let orchestrator = ExtractionOrchestrator::new();
        assert_eq!(
            orchestrator.extract_html("   ", &["phone"], None).unwrap_err(),
            DocumentError::Empty
        );

        let small = orchestrator.with_extraction(ExtractionConfig {
            max_document_bytes: 16,
            ..ExtractionConfig::default()
        });
        assert!(matches!(
            small.extract_html(TABLE_BASED, &["phone"], None),
            Err(DocumentError::TooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn test_batch_preserves_order() {
        let orchestrator = ExtractionOrchestrator::new();
        let documents = vec![TABLE_BASED, "", MINIMAL];
        let reports = orchestrator.extract_batch(&documents, &["phone"]);
        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports[0].as_ref().unwrap().value("phone"),
            Some(&phone("0912345678"))
        );
        assert_eq!(reports[1].as_ref().unwrap_err(), &DocumentError::Empty);
        assert_eq!(
            reports[2].as_ref().unwrap().value("phone"),
            Some(&phone("0932111222"))
        );
    }

    #[test]
    fn test_batch_reports_progress_per_document() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let orchestrator = ExtractionOrchestrator::new();
        let documents = vec![TABLE_BASED, DIV_BASED, "", MINIMAL];
        let done = AtomicUsize::new(0);
        let reports = orchestrator.extract_batch_with_progress(&documents, &["phone"], || {
            done.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(reports.len(), 4);
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_deeply_nested_document_extracts() {
        let depth = 50_000;
        let html = format!(
            "{}<p>SĐT: 0912345678</p>{}",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let orchestrator = ExtractionOrchestrator::new();
        let fields = orchestrator.default_fields();
        let report = orchestrator.extract_html(&html, &fields, None).unwrap();
        assert_eq!(report.results.len(), fields.len());
        assert_eq!(report.value("phone"), Some(&phone("0912345678")));
        assert!(report.profile.div_count >= depth);

        // Unclosed nesting of mixed containers.
        let html = format!(
            "{}<span>Thu nhập: 12 triệu đồng</span>",
            "<section><ul><li><span>".repeat(2_000)
        );
        let report = orchestrator.extract_html(&html, &fields, None).unwrap();
        assert_eq!(report.results.len(), fields.len());
        assert_eq!(report.value("income"), Some(&income(12_000_000)));
    }

    #[test]
    fn test_wide_document_extracts() {
        let rows: String = (0..5_000)
            .map(|i| format!("<tr><td>Mục {}</td><td>{}</td></tr>", i, i))
            .collect();
        let html = format!(
            "<table>{}</table><table><tr><td>Mã hộ:</td><td>HGD202301234</td></tr></table>",
            rows
        );
        let orchestrator = ExtractionOrchestrator::new();
        let fields = orchestrator.default_fields();
        let report = orchestrator.extract_html(&html, &fields, None).unwrap();
        assert_eq!(report.results.len(), fields.len());
        assert_eq!(report.value("household_code"), Some(&code("HGD202301234")));
    }

    #[test]
    fn test_document_at_size_limit() {
        let html = "<p>SĐT: 0912345678</p>";
        let exact = ExtractionOrchestrator::new().with_extraction(ExtractionConfig {
            max_document_bytes: html.len(),
            ..ExtractionConfig::default()
        });
        let report = exact.extract_html(html, &["phone"], None).unwrap();
        assert_eq!(report.value("phone"), Some(&phone("0912345678")));

        let short = ExtractionOrchestrator::new().with_extraction(ExtractionConfig {
            max_document_bytes: html.len() - 1,
            ..ExtractionConfig::default()
        });
        assert!(matches!(
            short.extract_html(html, &["phone"], None),
            Err(DocumentError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_from_config_rejects_inconsistent_values() {
        let mut config = VssxConfig::default();
        config.scoring.regex.floor = 0.95;
        assert!(matches!(
            ExtractionOrchestrator::from_config(config),
            Err(crate::VssxError::Config(_))
        ));

        let mut config = VssxConfig::default();
        config.patterns.push(crate::models::PatternOverride {
            field: "phone".to_string(),
            regex_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            ExtractionOrchestrator::from_config(config),
            Err(crate::VssxError::Pattern(_))
        ));
    }

    #[test]
    fn test_orchestrator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtractionOrchestrator>();
        assert_send_sync::<Document>();
    }

    #[test]
    fn test_from_config_with_new_field() {
        let mut config = VssxConfig::default();
        config.patterns.push(crate::models::PatternOverride {
            field: "tax_code".to_string(),
            field_type: Some("alphanumeric_code".to_string()),
            regex_patterns: vec![r"MST:\s*(\d{10})".to_string()],
            ..Default::default()
        });
        config.tables.banks.insert("NCB".to_string(), "National Citizen Bank".to_string());

        let orchestrator = ExtractionOrchestrator::from_config(config).unwrap();
        let report = orchestrator
            .extract_html(
                "<p>MST: 0101234567</p><p>Ngân hàng: NCB</p>",
                &["tax_code", "bank"],
                None,
            )
            .unwrap();
        assert_eq!(report.value("tax_code"), Some(&code("0101234567")));
        assert_eq!(report.value("bank"), Some(&bank("NCB", "National Citizen Bank")));
    }
}
