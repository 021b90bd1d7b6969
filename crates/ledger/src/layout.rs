use chrono::NaiveDate;
use configuration::Naming;
use core_types::schema;
use core_types::ViewKind;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Resolves where each view lives below the output root.
///
/// ```text
/// <root>/combined/<combined_file>
/// <root>/daily/<YYYY-MM-DD><daily_suffix>
/// <root>/ticker/<symbol>_<ticker_suffix>
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    combined_file: String,
    daily_suffix: String,
    ticker_suffix: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, naming: &Naming) -> Self {
        Self {
            root: root.into(),
            combined_file: naming.combined_file.clone(),
            daily_suffix: naming.daily_suffix.clone(),
            ticker_suffix: naming.ticker_suffix.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn view_dir(&self, view: ViewKind) -> PathBuf {
        self.root.join(view.dir_name())
    }

    pub fn combined_path(&self) -> PathBuf {
        self.view_dir(ViewKind::Combined).join(&self.combined_file)
    }

    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.view_dir(ViewKind::Daily).join(self.daily_file_name(date))
    }

    pub fn ticker_path(&self, symbol: &str) -> PathBuf {
        self.view_dir(ViewKind::Ticker).join(self.ticker_file_name(symbol))
    }

    pub fn daily_file_name(&self, date: NaiveDate) -> String {
        format!("{}{}", schema::format_date(date), self.daily_suffix)
    }

    /// Symbols are used verbatim except for characters that cannot appear in a
    /// file name, which become `_`.
    pub fn ticker_file_name(&self, symbol: &str) -> String {
        format!("{}_{}", safe_symbol(symbol), self.ticker_suffix)
    }

    /// Gives each symbol its own ticker file name.
    ///
    /// Symbols that need no replacement keep the plain name. A symbol whose
    /// replaced name is already taken is qualified with the hex bytes of the
    /// symbol. A symbol that still clashes is left out of the result.
    pub fn ticker_file_names<'s>(&self, symbols: impl IntoIterator<Item = &'s str>) -> BTreeMap<&'s str, String> {
        let (verbatim, mut replaced): (Vec<&str>, Vec<&str>) =
            symbols.into_iter().partition(|symbol| safe_symbol(symbol) == *symbol);
        replaced.sort_unstable();

        let mut names = BTreeMap::new();
        let mut taken = HashSet::new();
        for symbol in verbatim {
            let name = self.ticker_file_name(symbol);
            taken.insert(name.clone());
            names.insert(symbol, name);
        }
        for symbol in replaced {
            let plain = self.ticker_file_name(symbol);
            let qualified = format!("{}~{}_{}", safe_symbol(symbol), hex(symbol), self.ticker_suffix);
            if let Some(name) = [plain, qualified].into_iter().find(|name| !taken.contains(name)) {
                taken.insert(name.clone());
                names.insert(symbol, name);
            }
        }
        names
    }

    /// Decodes the date a daily file represents, or `None` when the name is
    /// not a daily file name.
    pub fn date_of_daily_file(&self, file_name: &str) -> Option<NaiveDate> {
        let stem = file_name.strip_suffix(&self.daily_suffix)?;
        schema::parse_date(stem).ok()
    }
}

fn safe_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn hex(symbol: &str) -> String {
    symbol.bytes().map(|b| format!("{b:02x}")).collect()
}
