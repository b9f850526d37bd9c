use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{CatalogError, CatalogSnapshot, LoanOffer, OfferCatalog};

/// Rates table backed by the scraper's CSV export.
///
/// A reload parses the whole file before swapping the shared snapshot, so readers only ever
/// see a complete table. A failed reload keeps the previous snapshot.
#[derive(Debug)]
pub struct CsvOfferCatalog {
    path: PathBuf,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl CsvOfferCatalog {
    /// Catalog that has not been read yet.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// Catalog with an initial load attempt; a failure leaves it unavailable.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let catalog = Self::new(path);
        match catalog.reload() {
            Ok(count) => info!(path = %catalog.path.display(), offers = count, "offer catalog loaded"),
            Err(err) => warn!(error = %err, "offer catalog unavailable at startup"),
        }
        catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and swap it in, returning the number of offers now served.
    pub fn reload(&self) -> Result<usize, CatalogError> {
        let snapshot = read_catalog(&self.path)?;
        let count = snapshot.offers.len();
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(snapshot));
        Ok(count)
    }

    /// Reload every `every` until the runtime shuts down.
    pub fn spawn_refresh(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.reload() {
                    Ok(count) => debug!(offers = count, "offer catalog refreshed"),
                    Err(err) => warn!(error = %err, "offer catalog refresh failed; serving previous snapshot"),
                }
            }
        })
    }
}

impl OfferCatalog for CsvOfferCatalog {
    fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CatalogError::NotLoaded)
    }
}

pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogSnapshot, CatalogError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CatalogError::Missing(path.to_path_buf())
        } else {
            CatalogError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(CatalogSnapshot::new(parse_offers(&raw)?))
}

/// Header names every catalog export must carry.
pub const CATALOG_COLUMNS: [&str; 4] = ["Loan Type", "Bank", "Interest Rate", "Link"];

/// Parse `Loan Type,Bank,Interest Rate,Link` rows; a leading BOM and extra columns are ignored.
///
/// A missing header column fails the whole table. Individual rows that cannot be read are
/// skipped with a warning so the rest of the table stays servable.
pub fn parse_offers(data: &str) -> Result<Vec<LoanOffer>, CatalogError> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    if let Some(missing) = CATALOG_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(CatalogError::MissingColumn(*missing));
    }

    let mut offers = Vec::new();
    for (index, row) in reader.deserialize::<LoanOffer>().enumerate() {
        match row {
            Ok(offer) => offers.push(offer),
            Err(err) => warn!(row = index + 1, error = %err, "skipping unreadable catalog row"),
        }
    }
    Ok(offers)
}
