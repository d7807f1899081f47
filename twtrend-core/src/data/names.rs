//! Display-name resolution for security codes.
//!
//! Sources are tried in order and the first hit wins:
//! 1. the built-in manual table (popular listings, localized names),
//! 2. an optional secondary `code,name` CSV table, if configured and loaded,
//! 3. the raw code itself.
//!
//! Whether the secondary table loaded is decided once at startup and kept in
//! [`NameDirectory`], which is passed to whoever needs names.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::NamesConfig;
use crate::domain::SecurityCode;

/// One link of the fallback chain.
pub trait NameSource: Send + Sync {
    fn source_name(&self) -> &str;

    fn lookup(&self, code: &SecurityCode) -> Option<String>;
}

const MANUAL_NAMES: &[(&str, &str)] = &[
    // 電子/半導體
    ("2330", "台積電"),
    ("2317", "鴻海"),
    ("2454", "聯發科"),
    ("2303", "聯電"),
    ("2308", "台達電"),
    ("2382", "廣達"),
    ("2357", "華碩"),
    ("3231", "緯創"),
    ("3711", "日月光投控"),
    ("3034", "聯詠"),
    ("2379", "瑞昱"),
    ("3008", "大立光"),
    ("6669", "緯穎"),
    ("2345", "智邦"),
    ("2412", "中華電"),
    ("3045", "台灣大"),
    ("4904", "遠傳"),
    // 金融
    ("2881", "富邦金"),
    ("2882", "國泰金"),
    ("2886", "兆豐金"),
    ("2891", "中信金"),
    ("2884", "玉山金"),
    ("2892", "第一金"),
    ("2880", "華南金"),
    ("2885", "元大金"),
    ("2883", "開發金"),
    ("2890", "永豐金"),
    ("2887", "台新金"),
    ("5880", "合庫金"),
    // 傳產/航運/塑化/水泥
    ("2603", "長榮"),
    ("2609", "陽明"),
    ("2615", "萬海"),
    ("2618", "長榮航"),
    ("2610", "華航"),
    ("1301", "台塑"),
    ("1303", "南亞"),
    ("1326", "台化"),
    ("1304", "台聚"),
    ("2002", "中鋼"),
    ("1101", "台泥"),
    ("1102", "亞泥"),
    ("1605", "華新"),
    // ETF
    ("0050", "元大台灣50"),
    ("0056", "元大高股息"),
    ("00878", "國泰永續高股息"),
    ("00929", "復華台灣科技優息"),
    ("00940", "元大台灣價值高息"),
    ("00919", "群益台灣精選高息"),
    ("006208", "富邦台50"),
    ("00713", "元大台灣高息低波"),
    ("00939", "統一台灣高息動能"),
];

/// Built-in table; highest priority.
#[derive(Debug, Clone)]
pub struct ManualNames {
    names: HashMap<&'static str, &'static str>,
}

impl ManualNames {
    pub fn builtin() -> Self {
        Self {
            names: MANUAL_NAMES.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameSource for ManualNames {
    fn source_name(&self) -> &str {
        "manual"
    }

    fn lookup(&self, code: &SecurityCode) -> Option<String> {
        self.names.get(code.as_str()).map(|n| n.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct NameRow {
    code: String,
    name: String,
}

/// Secondary table loaded from a `code,name` CSV file.
#[derive(Debug, Clone, Default)]
pub struct TableNames {
    names: HashMap<String, String>,
}

impl TableNames {
    pub fn from_csv_path(path: &Path) -> Result<Self, String> {
        let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, String> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut names = HashMap::new();
        for (line, record) in rdr.deserialize::<NameRow>().enumerate() {
            let row = record.map_err(|e| format!("row {}: {e}", line + 1))?;
            if !row.code.is_empty() && !row.name.is_empty() {
                names.insert(row.code, row.name);
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameSource for TableNames {
    fn source_name(&self) -> &str {
        "secondary"
    }

    fn lookup(&self, code: &SecurityCode) -> Option<String> {
        self.names.get(code.as_str()).cloned()
    }
}

/// Prioritized list of sources; echoes the code when all miss.
pub struct NameResolver {
    sources: Vec<Box<dyn NameSource>>,
}

impl NameResolver {
    pub fn new(sources: Vec<Box<dyn NameSource>>) -> Self {
        Self { sources }
    }

    pub fn resolve(&self, code: &SecurityCode) -> String {
        self.sources
            .iter()
            .find_map(|s| s.lookup(code))
            .unwrap_or_else(|| code.to_string())
    }

    /// Like [`resolve`](Self::resolve) but also reports which source answered.
    pub fn resolve_with_source(&self, code: &SecurityCode) -> (String, &str) {
        for source in &self.sources {
            if let Some(name) = source.lookup(code) {
                return (name, source.source_name());
            }
        }
        (code.to_string(), "code")
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// Outcome of loading the secondary table at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryStatus {
    Loaded { path: PathBuf, entries: usize },
    NotConfigured,
    Failed { path: PathBuf, reason: String },
}

impl SecondaryStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SecondaryStatus::Loaded { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            SecondaryStatus::Loaded { path, entries } => {
                format!("中文名稱模組: 已啟用 ({entries} entries from {})", path.display())
            }
            SecondaryStatus::NotConfigured => "中文名稱模組: 未設定".to_string(),
            SecondaryStatus::Failed { path, reason } => {
                format!("中文名稱模組: 載入失敗 {}: {reason}", path.display())
            }
        }
    }
}

/// Startup result: the resolver plus what happened to the secondary table.
pub struct NameDirectory {
    pub resolver: NameResolver,
    pub secondary: SecondaryStatus,
}

impl NameDirectory {
    pub fn init(config: &NamesConfig) -> Self {
        let mut sources: Vec<Box<dyn NameSource>> = vec![Box::new(ManualNames::builtin())];

        let secondary = match &config.secondary_table {
            None => SecondaryStatus::NotConfigured,
            Some(path) => match TableNames::from_csv_path(path) {
                Ok(table) => {
                    info!(path = %path.display(), entries = table.len(), "loaded secondary name table");
                    let entries = table.len();
                    sources.push(Box::new(table));
                    SecondaryStatus::Loaded {
                        path: path.clone(),
                        entries,
                    }
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "secondary name table unavailable");
                    SecondaryStatus::Failed {
                        path: path.clone(),
                        reason,
                    }
                }
            },
        };

        Self {
            resolver: NameResolver::new(sources),
            secondary,
        }
    }

    /// Built-in table only.
    pub fn builtin() -> Self {
        Self::init(&NamesConfig::default())
    }

    pub fn resolve(&self, code: &SecurityCode) -> String {
        self.resolver.resolve(code)
    }
}
