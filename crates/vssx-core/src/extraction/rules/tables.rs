//! Lookup tables shared by the normalizers and validators.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::TableOverrides;

const BANKS: &[(&str, &str)] = &[
    ("VCB", "Vietcombank"),
    ("TCB", "Techcombank"),
    ("CTG", "VietinBank"),
    ("BID", "BIDV"),
    ("MBB", "MB Bank"),
    ("VPB", "VPBank"),
    ("ACB", "Asia Commercial Bank"),
    ("SHB", "Saigon-Hanoi Bank"),
    ("EIB", "Eximbank"),
    ("OCB", "Orient Commercial Bank"),
    ("TPB", "TPBank"),
    ("HDB", "HDBank"),
    ("VIB", "Vietnam International Bank"),
    ("SSB", "SeABank"),
    ("STB", "Sacombank"),
    ("AGR", "Agribank"),
    ("LPB", "LienVietPostBank"),
];

const BANK_ALIASES: &[(&str, &str)] = &[
    ("vietcombank", "VCB"),
    ("ngoại thương", "VCB"),
    ("techcombank", "TCB"),
    ("kỹ thương", "TCB"),
    ("vietinbank", "CTG"),
    ("công thương", "CTG"),
    ("bidv", "BID"),
    ("đầu tư và phát triển", "BID"),
    ("mb bank", "MBB"),
    ("mbbank", "MBB"),
    ("mb", "MBB"),
    ("quân đội", "MBB"),
    ("vpbank", "VPB"),
    ("việt nam thịnh vượng", "VPB"),
    ("á châu", "ACB"),
    ("asia commercial", "ACB"),
    ("sài gòn - hà nội", "SHB"),
    ("saigon-hanoi", "SHB"),
    ("eximbank", "EIB"),
    ("xuất nhập khẩu", "EIB"),
    ("phương đông", "OCB"),
    ("orient commercial", "OCB"),
    ("tpbank", "TPB"),
    ("tiên phong", "TPB"),
    ("hdbank", "HDB"),
    ("phát triển tp", "HDB"),
    ("quốc tế", "VIB"),
    ("vietnam international", "VIB"),
    ("sea", "SSB"),
    ("seabank", "SSB"),
    ("đông nam á", "SSB"),
    ("sacombank", "STB"),
    ("sài gòn thương tín", "STB"),
    ("agribank", "AGR"),
    ("nông nghiệp", "AGR"),
    ("lienvietpostbank", "LPB"),
    ("bưu điện liên việt", "LPB"),
];

const RELATIONSHIPS: &[(&str, &str)] = &[
    ("chủ hộ", "Chủ hộ"),
    ("chu ho", "Chủ hộ"),
    ("vợ", "Vợ"),
    ("vo", "Vợ"),
    ("wife", "Vợ"),
    ("chồng", "Chồng"),
    ("chong", "Chồng"),
    ("husband", "Chồng"),
    ("con", "Con"),
    ("con trai", "Con"),
    ("con gái", "Con"),
    ("con gai", "Con"),
    ("son", "Con"),
    ("daughter", "Con"),
    ("child", "Con"),
    ("cha", "Cha"),
    ("bố", "Cha"),
    ("bo", "Cha"),
    ("father", "Cha"),
    ("mẹ", "Mẹ"),
    ("me", "Mẹ"),
    ("mother", "Mẹ"),
    ("anh", "Anh"),
    ("chị", "Chị"),
    ("chi", "Chị"),
    ("em", "Em"),
    ("ông", "Ông"),
    ("ong", "Ông"),
    ("bà", "Bà"),
    ("ba", "Bà"),
    ("chú", "Chú"),
    ("chu", "Chú"),
    ("cô", "Cô"),
    ("co", "Cô"),
    ("bác", "Bác"),
    ("bac", "Bác"),
    ("dì", "Dì"),
    ("di", "Dì"),
    ("dượng", "Dượng"),
    ("duong", "Dượng"),
    ("cháu", "Cháu"),
    ("chau", "Cháu"),
];

const MULTIPLIERS: &[(&str, i64)] = &[
    ("triệu", 1_000_000),
    ("trieu", 1_000_000),
    ("tr", 1_000_000),
    ("million", 1_000_000),
    ("nghìn", 1_000),
    ("nghin", 1_000),
    ("ngàn", 1_000),
    ("ngan", 1_000),
    ("thousand", 1_000),
    ("k", 1_000),
    ("tỷ", 1_000_000_000),
    ("tỉ", 1_000_000_000),
    ("ty", 1_000_000_000),
    ("billion", 1_000_000_000),
];

const MOBILE_PREFIXES: &[(&str, &str)] = &[
    ("032", "Viettel"),
    ("033", "Viettel"),
    ("034", "Viettel"),
    ("035", "Viettel"),
    ("036", "Viettel"),
    ("037", "Viettel"),
    ("038", "Viettel"),
    ("039", "Viettel"),
    ("086", "Viettel"),
    ("096", "Viettel"),
    ("097", "Viettel"),
    ("098", "Viettel"),
    ("070", "Mobifone"),
    ("076", "Mobifone"),
    ("077", "Mobifone"),
    ("078", "Mobifone"),
    ("079", "Mobifone"),
    ("089", "Mobifone"),
    ("090", "Mobifone"),
    ("093", "Mobifone"),
    ("081", "Vinaphone"),
    ("082", "Vinaphone"),
    ("083", "Vinaphone"),
    ("084", "Vinaphone"),
    ("085", "Vinaphone"),
    ("088", "Vinaphone"),
    ("091", "Vinaphone"),
    ("094", "Vinaphone"),
    ("056", "Vietnamobile"),
    ("058", "Vietnamobile"),
    ("092", "Vietnamobile"),
    ("059", "Gmobile"),
    ("099", "Gmobile"),
];

/// Bank, kinship, multiplier and carrier-prefix tables.
///
/// Keys for word lookups are stored lowercase; bank codes uppercase.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationTables {
    banks: BTreeMap<String, String>,
    bank_aliases: BTreeMap<String, String>,
    relationships: BTreeMap<String, String>,
    multipliers: BTreeMap<String, i64>,
    mobile_prefixes: BTreeMap<String, String>,
}

impl NormalizationTables {
    /// The built-in tables.
    pub fn builtin() -> Self {
        fn owned(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        Self {
            banks: owned(BANKS),
            bank_aliases: owned(BANK_ALIASES),
            relationships: owned(RELATIONSHIPS),
            multipliers: MULTIPLIERS.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            mobile_prefixes: owned(MOBILE_PREFIXES),
        }
    }

    /// Built-in tables extended (and overridden) by configuration.
    pub fn with_overrides(overrides: &TableOverrides) -> Self {
        let mut tables = Self::builtin();
        for (code, name) in &overrides.banks {
            tables
                .banks
                .insert(code.trim().to_uppercase(), name.trim().to_string());
        }
        for (alias, code) in &overrides.bank_aliases {
            tables
                .bank_aliases
                .insert(alias.trim().to_lowercase(), code.trim().to_uppercase());
        }
        for (word, canonical) in &overrides.relationships {
            tables
                .relationships
                .insert(word.trim().to_lowercase(), canonical.trim().to_string());
        }
        for (word, factor) in &overrides.multipliers {
            tables.multipliers.insert(word.trim().to_lowercase(), *factor);
        }
        for (prefix, carrier) in &overrides.mobile_prefixes {
            tables
                .mobile_prefixes
                .insert(prefix.trim().to_string(), carrier.trim().to_string());
        }
        debug!(
            "Normalization tables: {} banks, {} aliases, {} relationships",
            tables.banks.len(),
            tables.bank_aliases.len(),
            tables.relationships.len()
        );
        tables
    }

    /// Full name for a bank code (case-insensitive).
    pub fn bank_name(&self, code: &str) -> Option<&str> {
        self.banks.get(&code.trim().to_uppercase()).map(String::as_str)
    }

    /// Bank codes with their full names.
    pub fn banks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.banks.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Aliases (lowercase) with the code they map to.
    pub fn bank_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bank_aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bank code for an exact alias.
    pub fn bank_alias(&self, alias: &str) -> Option<&str> {
        self.bank_aliases
            .get(&alias.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Canonical relationship for a kinship word.
    pub fn relationship(&self, word: &str) -> Option<&str> {
        self.relationships
            .get(&word.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Whether `relationship` is one of the canonical names.
    pub fn is_canonical_relationship(&self, relationship: &str) -> bool {
        self.relationships.values().any(|v| v == relationship)
    }

    /// Factor for a multiplier keyword.
    pub fn multiplier(&self, word: &str) -> Option<i64> {
        self.multipliers.get(&word.trim().to_lowercase()).copied()
    }

    /// Carrier for the first three digits of a local phone number.
    pub fn carrier(&self, phone: &str) -> Option<&str> {
        let prefix = phone.get(..3)?;
        self.mobile_prefixes.get(prefix).map(String::as_str)
    }
}

impl Default for NormalizationTables {
    fn default() -> Self {
        Self::builtin()
    }
}
