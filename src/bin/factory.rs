use patterns::prelude::*;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::str::FromStr;

// =============================================================================
// Products
// =============================================================================

trait Vehicle {
    fn kind(&self) -> String;
    fn start(&self, out: &Narrator);
    fn stop(&self, out: &Narrator);
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PatternError::invalid_argument(format!("{what} cannot be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

struct Car {
    model: String,
}

impl Car {
    fn new(model: &str) -> Result<Self> {
        Ok(Self { model: non_empty(model, "Car model")? })
    }
}

impl Vehicle for Car {
    fn kind(&self) -> String {
        format!("Car ({})", self.model)
    }

    fn start(&self, out: &Narrator) {
        narrate!(out, "Car {} engine started with key ignition", self.model);
    }

    fn stop(&self, out: &Narrator) {
        narrate!(out, "Car {} engine stopped", self.model);
    }
}

struct Motorcycle {
    brand: String,
}

impl Motorcycle {
    fn new(brand: &str) -> Result<Self> {
        Ok(Self { brand: non_empty(brand, "Motorcycle brand")? })
    }
}

impl Vehicle for Motorcycle {
    fn kind(&self) -> String {
        format!("Motorcycle ({})", self.brand)
    }

    fn start(&self, out: &Narrator) {
        narrate!(out, "Motorcycle {} engine started with kick start", self.brand);
    }

    fn stop(&self, out: &Narrator) {
        narrate!(out, "Motorcycle {} engine stopped", self.brand);
    }
}

struct Truck {
    capacity_tons: u32,
}

impl Truck {
    fn new(capacity_tons: u32) -> Result<Self> {
        if capacity_tons == 0 {
            return Err(PatternError::invalid_argument("Truck capacity must be positive"));
        }
        Ok(Self { capacity_tons })
    }

    /// Empty parameter means `default`; anything else must be a positive integer.
    fn from_param(param: &str, default: u32) -> Result<Self> {
        let capacity = match param.trim() {
            "" => default,
            text => text.parse().map_err(|_| {
                PatternError::invalid_argument(format!(
                    "Invalid capacity parameter for truck: {text}"
                ))
            })?,
        };
        Self::new(capacity)
    }
}

impl Vehicle for Truck {
    fn kind(&self) -> String {
        format!("Truck ({}T)", self.capacity_tons)
    }

    fn start(&self, out: &Narrator) {
        narrate!(out, "Truck with {}T capacity engine started", self.capacity_tons);
    }

    fn stop(&self, out: &Narrator) {
        out.say("Truck engine stopped");
    }
}

struct ElectricCar {
    model: String,
}

impl Vehicle for ElectricCar {
    fn kind(&self) -> String {
        format!("Electric Car ({})", self.model)
    }

    fn start(&self, out: &Narrator) {
        narrate!(out, "Electric car {} started silently", self.model);
    }

    fn stop(&self, out: &Narrator) {
        narrate!(out, "Electric car {} stopped", self.model);
    }
}

fn or_default<'a>(param: &'a str, default: &'a str) -> &'a str {
    if param.trim().is_empty() {
        default
    } else {
        param
    }
}

// =============================================================================
// Registration-based factory
// =============================================================================

type Creator = Box<dyn Fn(&str) -> Result<Box<dyn Vehicle>>>;

/// Maps a type name to a constructor. New types can be registered at
/// runtime without touching the factory.
struct VehicleFactory {
    creators: BTreeMap<String, Creator>,
}

impl VehicleFactory {
    fn new() -> Self {
        let mut factory = Self { creators: BTreeMap::new() };
        factory.insert("car", |param| Ok(Box::new(Car::new(or_default(param, "Generic Car"))?)));
        factory.insert("motorcycle", |param| {
            Ok(Box::new(Motorcycle::new(or_default(param, "Generic Bike"))?))
        });
        factory.insert("truck", |param| Ok(Box::new(Truck::from_param(param, 10)?)));
        factory
    }

    fn insert<F>(&mut self, kind: &str, creator: F) -> bool
    where
        F: Fn(&str) -> Result<Box<dyn Vehicle>> + 'static,
    {
        self.creators.insert(kind.to_string(), Box::new(creator)).is_some()
    }

    /// Returns whether an existing creator was replaced.
    fn register<F>(&mut self, kind: &str, creator: F) -> Result<bool>
    where
        F: Fn(&str) -> Result<Box<dyn Vehicle>> + 'static,
    {
        let kind = non_empty(kind, "Vehicle type")?.to_lowercase();
        let replaced = self.insert(&kind, creator);
        tracing::debug!(kind = %kind, replaced, "creator registered");
        Ok(replaced)
    }

    fn create(&self, kind: &str, param: &str) -> Result<Box<dyn Vehicle>> {
        let creator = self
            .creators
            .get(&kind.to_lowercase())
            .ok_or_else(|| {
                PatternError::invalid_argument(format!("Unknown vehicle type: {kind}"))
            })?;
        creator(param)
    }

    fn available_types(&self) -> Vec<&str> {
        self.creators.keys().map(String::as_str).collect()
    }
}

// =============================================================================
// Simple factory over a closed set
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VehicleType {
    Car,
    Motorcycle,
    Truck,
}

impl FromStr for VehicleType {
    type Err = PatternError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "motorcycle" | "bike" => Ok(Self::Motorcycle),
            "truck" => Ok(Self::Truck),
            _ => Err(PatternError::invalid_argument(format!("Unknown vehicle type: {name}"))),
        }
    }
}

struct SimpleVehicleFactory;

impl SimpleVehicleFactory {
    fn create(kind: VehicleType, param: &str) -> Result<Box<dyn Vehicle>> {
        let vehicle: Box<dyn Vehicle> = match kind {
            VehicleType::Car => Box::new(Car::new(or_default(param, "Default Car"))?),
            VehicleType::Motorcycle => {
                Box::new(Motorcycle::new(or_default(param, "Default Bike"))?)
            }
            VehicleType::Truck => Box::new(Truck::from_param(param, 15)?),
        };
        Ok(vehicle)
    }
}

// =============================================================================
// Demo (cargo run --bin factory)
// =============================================================================

fn demonstrate(vehicle: Box<dyn Vehicle>, out: &Narrator) {
    narrate!(out, "Created: {}", vehicle.kind());
    vehicle.start(out);
    vehicle.stop(out);
    out.say("---");
}

fn registry_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Registration-Based Factory");
    let mut factory = VehicleFactory::new();
    narrate!(out, "Available vehicle types: {}", factory.available_types().join(" "));
    out.blank();

    let orders = [
        ("car", "Toyota Camry"),
        ("motorcycle", "Harley Davidson"),
        ("truck", "25"),
        ("truck", ""),
    ];
    for (kind, param) in orders {
        demonstrate(factory.create(kind, param)?, out);
    }

    factory.register("electric_car", |param| {
        Ok(Box::new(ElectricCar { model: or_default(param, "Tesla Model 3").to_string() }))
    })?;
    narrate!(out, "Registered electric_car; types now: {}", factory.available_types().join(" "));
    demonstrate(factory.create("electric_car", "Tesla Model S")?, out);
    Ok(())
}

fn simple_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Simple Factory");
    for (name, param) in [("car", "BMW X5"), ("bike", "Yamaha R1"), ("truck", "50")] {
        let kind: VehicleType = name.parse()?;
        demonstrate(SimpleVehicleFactory::create(kind, param)?, out);
    }
    Ok(())
}

fn errors_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Error Handling");
    let factory = VehicleFactory::new();
    let orders = [
        ("airplane", "Boeing 737"),
        ("car", "   "),
        ("truck", "heavy"),
        ("truck", "0"),
    ];
    for (kind, param) in orders {
        narrate!(out, "Creating {kind} with '{param}':");
        if let Some(vehicle) = factory.create(kind, param).or_narrate(out)? {
            demonstrate(vehicle, out);
        }
    }
    "hovercraft".parse::<VehicleType>().map(|_| ()).or_narrate(out)?;
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Factory", |out, _config| {
        registry_demo(out)?;
        simple_demo(out)?;
        errors_demo(out)?;
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin factory)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_empty_params() {
        let factory = VehicleFactory::new();
        assert_eq!(factory.create("car", "").unwrap().kind(), "Car (Generic Car)");
        assert_eq!(factory.create("motorcycle", " ").unwrap().kind(), "Motorcycle (Generic Bike)");
        assert_eq!(factory.create("truck", "").unwrap().kind(), "Truck (10T)");
        assert_eq!(
            SimpleVehicleFactory::create(VehicleType::Truck, "").unwrap().kind(),
            "Truck (15T)"
        );
    }

    #[test]
    fn test_type_lookup_is_case_insensitive() {
        let factory = VehicleFactory::new();
        assert_eq!(factory.create("CAR", "Mini").unwrap().kind(), "Car (Mini)");
        assert_eq!("Bike".parse::<VehicleType>().unwrap(), VehicleType::Motorcycle);
    }

    #[test]
    fn test_unknown_and_invalid_inputs() {
        let factory = VehicleFactory::new();
        let err = factory.create("airplane", "").err().unwrap();
        assert_eq!(err.to_string(), "Invalid argument: Unknown vehicle type: airplane");
        assert_eq!(
            factory.create("truck", "-3").err().unwrap().to_string(),
            "Invalid argument: Invalid capacity parameter for truck: -3"
        );
        assert_eq!(
            factory.create("truck", "0").err().unwrap().to_string(),
            "Invalid argument: Truck capacity must be positive"
        );
        assert!(Car::new("").is_err());
        assert!(Motorcycle::new("\t").is_err());
    }

    #[test]
    fn test_runtime_registration() {
        let mut factory = VehicleFactory::new();
        let replaced = factory
            .register("Electric_Car", |p| Ok(Box::new(ElectricCar { model: p.to_string() })))
            .unwrap();
        assert!(!replaced);
        assert_eq!(factory.available_types(), vec!["car", "electric_car", "motorcycle", "truck"]);
        assert_eq!(factory.create("electric_car", "Leaf").unwrap().kind(), "Electric Car (Leaf)");

        assert!(factory.register("truck", |_| Ok(Box::new(Truck::new(99)?))).unwrap());
        assert_eq!(factory.create("truck", "1").unwrap().kind(), "Truck (99T)");
        assert!(factory.register(" ", |_| Ok(Box::new(Truck::new(1)?))).is_err());
    }

    #[test]
    fn test_demonstrate_narrates_lifecycle() {
        let out = Narrator::capture();
        demonstrate(Box::new(Truck::new(25).unwrap()), &out);
        assert_eq!(
            out.lines(),
            vec![
                "Created: Truck (25T)",
                "Truck with 25T capacity engine started",
                "Truck engine stopped",
                "---",
            ]
        );
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        registry_demo(&out).unwrap();
        simple_demo(&out).unwrap();
        errors_demo(&out).unwrap();
        assert!(out.contains("Available vehicle types: car motorcycle truck"));
        assert!(out.contains("Electric car Tesla Model S started silently"));
        assert!(out.contains("Motorcycle Yamaha R1 engine started with kick start"));
        assert!(out.contains("❌ Invalid argument: Unknown vehicle type: airplane"));
        assert!(out.contains("❌ Invalid argument: Car model cannot be empty"));
        assert!(out.contains("❌ Invalid argument: Unknown vehicle type: hovercraft"));
        assert_eq!(out.count("---"), 8);
    }
}
