use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use patterns::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

// =============================================================================
// Entity
// =============================================================================

/// Field order is the on-disk column order: `id,name,price,stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    id: i64,
    name: String,
    price: f64,
    stock: i64,
}

impl Product {
    fn new(id: i64, name: &str, price: f64, stock: i64) -> Result<Self> {
        Self {
            id,
            name: name.to_string(),
            price,
            stock,
        }
        .validated()
    }

    fn validated(self) -> Result<Self> {
        if self.id < 0 {
            return Err(PatternError::invalid_argument("Product id cannot be negative"));
        }
        if self.name.trim().is_empty() {
            return Err(PatternError::invalid_argument("Product name cannot be empty"));
        }
        if !self.price.is_finite() {
            return Err(PatternError::invalid_argument("Price must be a finite number"));
        }
        if self.price < 0.0 {
            return Err(PatternError::invalid_argument("Price cannot be negative"));
        }
        if self.stock < 0 {
            return Err(PatternError::invalid_argument("Stock cannot be negative"));
        }
        Ok(self)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product{{id={}, name='{}', price={:.2}, stock={}}}",
            self.id, self.name, self.price, self.stock
        )
    }
}

// =============================================================================
// Repository roles
// =============================================================================

/// Generic persistence contract. `save` is an upsert; `update` only touches
/// existing entities.
trait Repository<T, Id> {
    fn save(&mut self, entity: T) -> Result<()>;
    fn find_by_id(&self, id: Id) -> Result<Option<T>>;
    /// All entities ordered by id.
    fn find_all(&self) -> Result<Vec<T>>;
    fn update(&mut self, entity: T) -> Result<bool>;
    fn delete_by_id(&mut self, id: Id) -> Result<bool>;
    fn count(&self) -> Result<usize>;
}

trait ProductRepository: Repository<Product, i64> {
    /// Products whose name contains `fragment`.
    fn find_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|product| product.name.contains(fragment))
            .collect())
    }

    /// Inclusive on both ends.
    fn find_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Product>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|product| product.price >= min && product.price <= max)
            .collect())
    }

    fn find_by_stock(&self, min_stock: i64) -> Result<Vec<Product>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|product| product.stock >= min_stock)
            .collect())
    }
}

// =============================================================================
// In-memory repository
// =============================================================================

#[derive(Debug, Default)]
struct InMemoryProductRepository {
    products: BTreeMap<i64, Product>,
}

impl Repository<Product, i64> for InMemoryProductRepository {
    fn save(&mut self, product: Product) -> Result<()> {
        self.products.insert(product.id, product);
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.products.get(&id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Product>> {
        Ok(self.products.values().cloned().collect())
    }

    fn update(&mut self, product: Product) -> Result<bool> {
        match self.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_by_id(&mut self, id: i64) -> Result<bool> {
        Ok(self.products.remove(&id).is_some())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.products.len())
    }
}

impl ProductRepository for InMemoryProductRepository {}

// =============================================================================
// File repository
// =============================================================================

/// Line-oriented store: one `id,name,price,stock` record per line, no header,
/// no quoting. The file is read once into a cache and rewritten on every
/// change. Unparseable lines are skipped.
#[derive(Debug)]
struct FileProductRepository {
    path: PathBuf,
    cache: RefCell<Option<BTreeMap<i64, Product>>>,
    skipped: Cell<usize>,
}

impl FileProductRepository {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RefCell::new(None),
            skipped: Cell::new(0),
        }
    }

    /// Lines dropped during the last load.
    fn skipped_lines(&self) -> usize {
        self.skipped.get()
    }

    fn read_file(&self) -> Result<BTreeMap<i64, Product>> {
        let mut products = BTreeMap::new();
        self.skipped.set(0);
        if !self.path.exists() {
            return Ok(products);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_path(&self.path)?;
        // Byte records fail only on I/O; text decoding is checked per line.
        for (line, record) in reader.byte_records().enumerate() {
            let record = record?;
            let parsed = StringRecord::from_byte_record(record)
                .map_err(|err| {
                    let reason = err.utf8_error();
                    PatternError::invalid_argument(format!("line is not UTF-8: {reason}"))
                })
                .and_then(|record| record.deserialize::<Product>(None).map_err(PatternError::from))
                .and_then(Product::validated);
            match parsed {
                Ok(product) => {
                    products.insert(product.id, product);
                }
                Err(err) => {
                    tracing::warn!(line = line + 1, error = %err, "skipping product line");
                    self.skipped.set(self.skipped.get() + 1);
                }
            }
        }
        tracing::debug!(path = %self.path.display(), count = products.len(), "products loaded");
        Ok(products)
    }

    fn write_file(&self, products: &BTreeMap<i64, Product>) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_path(&self.path)?;
        for product in products.values() {
            writer.serialize(product)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn with_cache<R>(&self, read: impl FnOnce(&BTreeMap<i64, Product>) -> R) -> Result<R> {
        if self.cache.borrow().is_none() {
            let loaded = self.read_file()?;
            *self.cache.borrow_mut() = Some(loaded);
        }
        let cache = self.cache.borrow();
        match cache.as_ref() {
            Some(products) => Ok(read(products)),
            None => Err(PatternError::fatal("product cache missing after load")),
        }
    }

    /// Applies `change`, persisting only when it reports a modification.
    fn modify(&mut self, change: impl FnOnce(&mut BTreeMap<i64, Product>) -> bool) -> Result<bool> {
        let mut products = match self.cache.get_mut().take() {
            Some(products) => products,
            None => self.read_file()?,
        };
        let changed = change(&mut products);
        let written = if changed { self.write_file(&products) } else { Ok(()) };
        *self.cache.get_mut() = Some(products);
        written.map(|()| changed)
    }
}

fn check_storable(product: &Product) -> Result<()> {
    if product.name.contains(|c| matches!(c, ',' | '\n' | '\r')) {
        return Err(PatternError::invalid_argument(format!(
            "Product name '{}' cannot be stored in a line file",
            product.name.escape_debug()
        )));
    }
    Ok(())
}

impl Repository<Product, i64> for FileProductRepository {
    fn save(&mut self, product: Product) -> Result<()> {
        check_storable(&product)?;
        self.modify(|products| {
            products.insert(product.id, product);
            true
        })
        .map(|_| ())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        self.with_cache(|products| products.get(&id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Product>> {
        self.with_cache(|products| products.values().cloned().collect())
    }

    fn update(&mut self, product: Product) -> Result<bool> {
        check_storable(&product)?;
        self.modify(|products| match products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product;
                true
            }
            None => false,
        })
    }

    fn delete_by_id(&mut self, id: i64) -> Result<bool> {
        self.modify(|products| products.remove(&id).is_some())
    }

    fn count(&self) -> Result<usize> {
        self.with_cache(BTreeMap::len)
    }
}

impl ProductRepository for FileProductRepository {}

// =============================================================================
// Service layer
// =============================================================================

struct ProductService {
    repository: Box<dyn ProductRepository>,
}

impl ProductService {
    fn new(repository: Box<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    fn add_product(&mut self, id: i64, name: &str, price: f64, stock: i64) -> Result<()> {
        self.repository.save(Product::new(id, name, price, stock)?)
    }

    fn get_product(&self, id: i64) -> Result<Option<Product>> {
        self.repository.find_by_id(id)
    }

    fn update_product(&mut self, id: i64, name: &str, price: f64, stock: i64) -> Result<bool> {
        self.repository.update(Product::new(id, name, price, stock)?)
    }

    fn remove_product(&mut self, id: i64) -> Result<bool> {
        self.repository.delete_by_id(id)
    }

    fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        self.repository.find_by_name(fragment)
    }

    fn products_in_price_range(&self, min: f64, max: f64) -> Result<Vec<Product>> {
        if min > max {
            return Err(PatternError::invalid_argument(format!(
                "Price range is empty: {min:.2} > {max:.2}"
            )));
        }
        self.repository.find_by_price_range(min, max)
    }

    fn available_products(&self, min_stock: i64) -> Result<Vec<Product>> {
        self.repository.find_by_stock(min_stock.max(1))
    }

    fn product_count(&self) -> Result<usize> {
        self.repository.count()
    }

    fn print_all(&self, out: &Narrator) -> Result<()> {
        let products = self.repository.find_all()?;
        if products.is_empty() {
            out.say("No products found.");
            return Ok(());
        }
        narrate!(out, "All Products ({}):", products.len());
        narrate!(out, "{:<6}{:<18}{:>10}{:>7}", "ID", "Name", "Price", "Stock");
        out.say("-".repeat(41));
        for product in products {
            narrate!(
                out,
                "{:<6}{:<18}{:>10}{:>7}",
                product.id,
                product.name,
                format!("${:.2}", product.price),
                product.stock
            );
        }
        Ok(())
    }
}

// =============================================================================
// Demo (cargo run --bin repository)
// =============================================================================

fn list(out: &Narrator, products: &[Product]) {
    if products.is_empty() {
        out.say("  (none)");
    }
    for product in products {
        narrate!(out, "Found: {product}");
    }
}

fn memory_demo(out: &Narrator) -> Result<()> {
    out.section(1, "In-Memory Repository");
    let mut service = ProductService::new(Box::<InMemoryProductRepository>::default());
    for (id, name, price, stock) in [
        (1, "Laptop", 999.99, 10),
        (2, "Mouse", 25.50, 50),
        (3, "Keyboard", 75.00, 25),
        (4, "Monitor", 299.99, 15),
        (5, "Cable", -3.0, 100),
    ] {
        service.add_product(id, name, price, stock).or_narrate(out)?;
    }

    out.blank();
    out.say("Products added. Current inventory:");
    service.print_all(out)?;

    out.blank();
    out.say("Finding product with ID 2:");
    match service.get_product(2)? {
        Some(product) => narrate!(out, "Found: {product}"),
        None => out.say("Product not found"),
    }
    narrate!(out, "Product with ID -1 present: {}", service.get_product(-1)?.is_some());

    out.blank();
    out.say("Searching for products containing 'Key':");
    list(out, &service.search_by_name("Key")?);

    out.blank();
    out.say("Products between $20 and $100:");
    list(out, &service.products_in_price_range(20.0, 100.0)?);
    service.products_in_price_range(100.0, 20.0).map(|_| ()).or_narrate(out)?;

    out.blank();
    out.say("Products with at least 20 in stock:");
    list(out, &service.available_products(20)?);

    out.blank();
    out.say("Updating product ID 1:");
    if service.update_product(1, "Gaming Laptop", 1299.99, 8)? {
        out.say("Product updated successfully");
        if let Some(updated) = service.get_product(1)? {
            narrate!(out, "Updated: {updated}");
        }
    }
    narrate!(out, "Updating missing product 42: {}", service.update_product(42, "Ghost", 1.0, 1)?);

    out.blank();
    out.say("Deleting product ID 2:");
    if service.remove_product(2)? {
        out.say("Product deleted successfully");
        out.say("Remaining products:");
        service.print_all(out)?;
    }
    narrate!(out, "Deleting product ID 2 again: {}", service.remove_product(2)?);
    Ok(())
}

fn file_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(2, "File Repository");
    let path = config.file_path("products.txt");
    if path.exists() {
        std::fs::remove_file(&path)?;
    }

    let mut service = ProductService::new(Box::new(FileProductRepository::new(&path)));
    service.add_product(100, "File Product 1", 49.99, 20)?;
    service.add_product(101, "File Product 2", 89.99, 15)?;
    service.add_product(102, "Nuts, Bolts", 4.99, 500).or_narrate(out)?;
    out.blank();
    out.say("Products saved to file:");
    service.print_all(out)?;

    let reopened = ProductService::new(Box::new(FileProductRepository::new(&path)));
    out.blank();
    out.say("Loading from file (new repository instance):");
    reopened.print_all(out)?;
    narrate!(out, "Products on disk: {}", reopened.product_count()?);
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Repository", |out, config| {
        memory_demo(out)?;
        file_demo(out, config)?;
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin repository)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn product(id: i64, name: &str, price: f64, stock: i64) -> Product {
        Product::new(id, name, price, stock).unwrap()
    }

    #[test]
    fn test_product_validation() {
        assert_eq!(
            Product::new(1, "x", -0.01, 1).unwrap_err().to_string(),
            "Invalid argument: Price cannot be negative"
        );
        assert_eq!(
            Product::new(1, "x", 1.0, -1).unwrap_err().to_string(),
            "Invalid argument: Stock cannot be negative"
        );
        assert!(Product::new(1, " ", 1.0, 1).is_err());
        assert!(Product::new(-1, "x", 1.0, 1).is_err());
        assert!(Product::new(1, "x", f64::NAN, 1).is_err());
        assert!(Product::new(1, "Free sample", 0.0, 0).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            product(2, "Mouse", 25.5, 50).to_string(),
            "Product{id=2, name='Mouse', price=25.50, stock=50}"
        );
    }

    #[test]
    fn test_in_memory_crud() {
        let mut repo = InMemoryProductRepository::default();
        repo.save(product(2, "Mouse", 25.5, 50)).unwrap();
        repo.save(product(1, "Laptop", 999.99, 10)).unwrap();
        let ids: Vec<i64> = repo.find_all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(repo.update(product(1, "Gaming Laptop", 1299.99, 8)).unwrap());
        assert!(!repo.update(product(9, "Ghost", 1.0, 1)).unwrap());
        assert_eq!(repo.find_by_id(1).unwrap().unwrap().name, "Gaming Laptop");

        assert!(repo.delete_by_id(2).unwrap());
        assert!(!repo.delete_by_id(2).unwrap());
        assert_eq!(repo.find_by_id(2).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.find_by_id(-1).unwrap(), None);
    }

    #[test]
    fn test_queries() {
        let mut repo = InMemoryProductRepository::default();
        for p in [
            product(1, "Keyboard", 75.0, 25),
            product(2, "Key Ring", 20.0, 0),
            product(3, "Monitor", 100.0, 15),
        ] {
            repo.save(p).unwrap();
        }
        assert_eq!(repo.find_by_name("Key").unwrap().len(), 2);
        let ranged: Vec<i64> =
            repo.find_by_price_range(20.0, 100.0).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ranged, vec![1, 2, 3]);
        assert_eq!(repo.find_by_stock(1).unwrap().len(), 2);
        assert!(repo.find_by_name("Lamp").unwrap().is_empty());
    }

    #[test]
    fn test_service_rejects_bad_input() {
        let mut service = ProductService::new(Box::<InMemoryProductRepository>::default());
        assert!(service.add_product(1, "Cable", -3.0, 1).is_err());
        assert_eq!(service.product_count().unwrap(), 0);
        let err = service.products_in_price_range(10.0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        service.add_product(1, "Out of stock", 1.0, 0).unwrap();
        assert!(service.available_products(0).unwrap().is_empty());
    }

    #[test]
    fn test_file_round_trip_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.txt");
        {
            let mut repo = FileProductRepository::new(&path);
            repo.save(product(100, "File Product 1", 49.99, 20)).unwrap();
            repo.save(product(101, "File Product 2", 89.99, 15)).unwrap();
            assert!(repo.delete_by_id(100).unwrap());
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "101,File Product 2,89.99,15\n");

        let reopened = FileProductRepository::new(&path);
        assert_eq!(
            reopened.find_by_id(101).unwrap(),
            Some(product(101, "File Product 2", 89.99, 15))
        );
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_file_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.txt");
        let text = concat!(
            "1,Lamp,19.5,3\nnot a record\n2,Desk,abc,1\n",
            "3,Chair,-1,2\n-4,Stool,5,1\n4,Rug,40,7\n"
        );
        std::fs::write(&path, text).unwrap();
        let repo = FileProductRepository::new(&path);
        let ids: Vec<i64> = repo.find_all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(repo.skipped_lines(), 4);
    }

    #[test]
    fn test_file_skips_lines_with_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.txt");
        std::fs::write(&path, b"1,Laptop,999.99,10\n2,Caf\xe9,3.5,1\n3,Mouse,25.5,50\n").unwrap();
        let repo = FileProductRepository::new(&path);
        assert_eq!(repo.find_by_id(3).unwrap(), Some(product(3, "Mouse", 25.5, 50)));
        assert_eq!(repo.find_by_id(2).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.skipped_lines(), 1);
    }

    #[test]
    fn test_file_rejects_unstorable_names() {
        let dir = TempDir::new().unwrap();
        let mut repo = FileProductRepository::new(dir.path().join("products.txt"));
        let err = repo.save(product(1, "Nuts, Bolts", 1.0, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(repo.count().unwrap(), 0);
        assert!(!dir.path().join("products.txt").exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = FileProductRepository::new(dir.path().join("absent.txt"));
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.find_by_id(1).unwrap(), None);
    }

    #[test]
    fn test_demo_runs() {
        let dir = TempDir::new().unwrap();
        let config = DemoConfig::for_tests().with_workdir(dir.path());
        let out = Narrator::capture();
        memory_demo(&out).unwrap();
        file_demo(&out, &config).unwrap();
        assert!(out.contains("❌ Invalid argument: Price cannot be negative"));
        assert!(out.contains("Found: Product{id=2, name='Mouse', price=25.50, stock=50}"));
        assert!(out.contains("Product with ID -1 present: false"));
        assert!(
            out.contains("Updated: Product{id=1, name='Gaming Laptop', price=1299.99, stock=8}")
        );
        assert!(out.contains("Updating missing product 42: false"));
        assert!(out.contains("Deleting product ID 2 again: false"));
        assert!(out.contains("Products on disk: 2"));
        assert!(config.file_path("products.txt").exists());
    }

    proptest! {
        #[test]
        fn prop_file_repository_round_trip(
            id in 0i64..100_000,
            name in "[A-Za-z][A-Za-z0-9 ]{0,15}",
            cents in 0u32..10_000_000,
            stock in 0i64..100_000,
        ) {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("products.txt");
            let entity = Product::new(id, &name, f64::from(cents) / 100.0, stock).unwrap();

            let mut repo = FileProductRepository::new(&path);
            repo.save(entity.clone()).unwrap();
            let reopened = FileProductRepository::new(&path);
            prop_assert_eq!(reopened.find_by_id(id).unwrap(), Some(entity));

            prop_assert!(repo.delete_by_id(id).unwrap());
            prop_assert_eq!(FileProductRepository::new(&path).find_by_id(id).unwrap(), None);
        }
    }
}
