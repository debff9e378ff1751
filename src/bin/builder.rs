use patterns::prelude::*;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Storage {
    gb: u32,
    kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Computer {
    cpu: String,
    gpu: String,
    ram_gb: u32,
    storage: Storage,
    motherboard: String,
    power_supply: String,
    operating_system: Option<String>,
    wifi: bool,
    bluetooth: bool,
    peripherals: Vec<String>,
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

impl fmt::Display for Computer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Computer Specifications:")?;
        writeln!(f, "  CPU: {}", self.cpu)?;
        writeln!(f, "  GPU: {}", self.gpu)?;
        writeln!(f, "  RAM: {} GB", self.ram_gb)?;
        writeln!(f, "  Storage: {} GB {}", self.storage.gb, self.storage.kind)?;
        writeln!(f, "  Motherboard: {}", self.motherboard)?;
        writeln!(f, "  Power Supply: {}", self.power_supply)?;
        if let Some(os) = &self.operating_system {
            writeln!(f, "  OS: {os}")?;
        }
        writeln!(f, "  WiFi: {}", enabled(self.wifi))?;
        write!(f, "  Bluetooth: {}", enabled(self.bluetooth))?;
        if !self.peripherals.is_empty() {
            write!(f, "\n  Peripherals: {}", self.peripherals.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

const MIN_RAM_GB: u32 = 4;
const MAX_RAM_GB: u32 = 2048;

/// Accumulates parts by value; nothing is checked until [`ComputerBuilder::build`].
#[derive(Debug, Clone, Default)]
struct ComputerBuilder {
    cpu: Option<String>,
    gpu: Option<String>,
    ram_gb: Option<u32>,
    storage: Option<Storage>,
    motherboard: Option<String>,
    power_supply: Option<String>,
    operating_system: Option<String>,
    wifi: bool,
    bluetooth: bool,
    peripherals: Vec<String>,
}

impl ComputerBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn cpu(mut self, cpu: &str) -> Self {
        self.cpu = Some(cpu.to_string());
        self
    }

    fn gpu(mut self, gpu: &str) -> Self {
        self.gpu = Some(gpu.to_string());
        self
    }

    fn ram(mut self, gb: u32) -> Self {
        self.ram_gb = Some(gb);
        self
    }

    fn storage(mut self, gb: u32, kind: &str) -> Self {
        self.storage = Some(Storage { gb, kind: kind.to_string() });
        self
    }

    fn motherboard(mut self, board: &str) -> Self {
        self.motherboard = Some(board.to_string());
        self
    }

    fn power_supply(mut self, psu: &str) -> Self {
        self.power_supply = Some(psu.to_string());
        self
    }

    fn peripheral(mut self, peripheral: &str) -> Self {
        self.peripherals.push(peripheral.to_string());
        self
    }

    fn os(mut self, os: &str) -> Self {
        self.operating_system = Some(os.to_string());
        self
    }

    fn wifi(mut self, enable: bool) -> Self {
        self.wifi = enable;
        self
    }

    fn bluetooth(mut self, enable: bool) -> Self {
        self.bluetooth = enable;
        self
    }

    /// Names of required parts still unset.
    fn missing_parts(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cpu.is_none() {
            missing.push("CPU");
        }
        if self.ram_gb.is_none() {
            missing.push("RAM");
        }
        if self.storage.is_none() {
            missing.push("storage");
        }
        if self.motherboard.is_none() {
            missing.push("motherboard");
        }
        if self.power_supply.is_none() {
            missing.push("power supply");
        }
        missing
    }

    fn build(self) -> Result<Computer> {
        let missing = self.missing_parts();
        if !missing.is_empty() {
            return Err(PatternError::precondition(format!(
                "Cannot build computer, missing: {}",
                missing.join(", ")
            )));
        }

        let ram_gb = self.ram_gb.unwrap_or_default();
        if !(MIN_RAM_GB..=MAX_RAM_GB).contains(&ram_gb) {
            return Err(PatternError::invalid_argument(format!(
                "RAM must be between {MIN_RAM_GB} and {MAX_RAM_GB} GB, got {ram_gb}"
            )));
        }
        let storage = self.storage.unwrap_or_else(|| Storage { gb: 0, kind: String::new() });
        if storage.gb == 0 {
            return Err(PatternError::invalid_argument("Storage capacity must be positive"));
        }

        Ok(Computer {
            cpu: self.cpu.unwrap_or_default(),
            gpu: self.gpu.unwrap_or_else(|| "Integrated Graphics".to_string()),
            ram_gb,
            storage,
            motherboard: self.motherboard.unwrap_or_default(),
            power_supply: self.power_supply.unwrap_or_default(),
            operating_system: self.operating_system,
            wifi: self.wifi,
            bluetooth: self.bluetooth,
            peripherals: self.peripherals,
        })
    }

    fn high_end_gaming() -> Self {
        Self::new()
            .cpu("Intel i9-13900K")
            .gpu("NVIDIA RTX 4090")
            .ram(32)
            .storage(2000, "NVMe SSD")
            .motherboard("ASUS ROG Maximus Z790")
            .power_supply("850W 80+ Gold")
            .peripheral("Gaming Keyboard")
            .peripheral("Gaming Mouse")
            .peripheral("144Hz Monitor")
            .os("Windows 11")
            .wifi(true)
            .bluetooth(true)
    }

    fn standard_office() -> Self {
        Self::new()
            .cpu("Intel i5-12400")
            .gpu("Integrated Graphics")
            .ram(16)
            .storage(512, "SSD")
            .motherboard("Standard ATX")
            .power_supply("500W 80+ Bronze")
            .peripheral("Standard Keyboard")
            .peripheral("Optical Mouse")
            .peripheral("24-inch Monitor")
            .os("Windows 11 Pro")
            .wifi(true)
            .bluetooth(true)
    }
}

// =============================================================================
// Director
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    BudgetGaming,
    Workstation,
    HomeServer,
}

/// Knows the step order for each preset; the builder knows how to hold parts.
struct ComputerDirector;

impl ComputerDirector {
    fn construct(&self, preset: Preset) -> Result<Computer> {
        tracing::debug!(?preset, "director constructing");
        match preset {
            Preset::BudgetGaming => self.budget_gaming(ComputerBuilder::new()),
            Preset::Workstation => self.workstation(ComputerBuilder::new()),
            Preset::HomeServer => ComputerBuilder::new()
                .cpu("AMD Ryzen 7 5700G")
                .ram(32)
                .storage(8000, "HDD RAID 1")
                .motherboard("ASRock B550M-ITX")
                .power_supply("450W 80+ Gold")
                .os("Debian 12")
                .build(),
        }
    }

    fn budget_gaming(&self, builder: ComputerBuilder) -> Result<Computer> {
        builder
            .cpu("AMD Ryzen 5 5600X")
            .gpu("NVIDIA RTX 3060")
            .ram(16)
            .storage(1000, "NVMe SSD")
            .motherboard("MSI B550M Pro")
            .power_supply("650W 80+ Bronze")
            .peripheral("Gaming Keyboard")
            .peripheral("Gaming Mouse")
            .os("Windows 11")
            .wifi(true)
            .build()
    }

    fn workstation(&self, builder: ComputerBuilder) -> Result<Computer> {
        builder
            .cpu("Intel Xeon W-2295")
            .gpu("NVIDIA Quadro RTX 4000")
            .ram(64)
            .storage(2000, "NVMe SSD")
            .motherboard("Workstation Motherboard")
            .power_supply("1000W 80+ Platinum")
            .peripheral("Professional Keyboard")
            .peripheral("Precision Mouse")
            .peripheral("4K Monitor")
            .os("Windows 11 Pro")
            .wifi(true)
            .bluetooth(true)
            .build()
    }
}

// =============================================================================
// Demo (cargo run --bin builder)
// =============================================================================

fn show(out: &Narrator, heading: &str, computer: &Computer) {
    out.blank();
    narrate!(out, "{heading}:");
    out.say("-".repeat(40));
    out.say(computer.to_string());
}

fn presets_demo(out: &Narrator) -> Result<()> {
    let director = ComputerDirector;
    show(out, "1. Gaming Computer (High-End)", &ComputerBuilder::high_end_gaming().build()?);
    show(
        out,
        "2. Budget Gaming Computer (using Director)",
        &director.construct(Preset::BudgetGaming)?,
    );
    show(out, "3. Office Computer", &ComputerBuilder::standard_office().build()?);
    show(out, "4. Workstation (using Director)", &director.construct(Preset::Workstation)?);
    show(out, "5. Home Server (using Director)", &director.construct(Preset::HomeServer)?);
    Ok(())
}

fn custom_demo(out: &Narrator) -> Result<()> {
    let custom = ComputerBuilder::new()
        .cpu("AMD Ryzen 9 7950X")
        .gpu("AMD Radeon RX 7900 XTX")
        .ram(64)
        .storage(4000, "NVMe SSD")
        .motherboard("ASUS ProArt X670E")
        .power_supply("1000W 80+ Titanium")
        .peripheral("Mechanical Keyboard")
        .peripheral("Ergonomic Mouse")
        .peripheral("Ultrawide Monitor")
        .os("Ubuntu 22.04 LTS")
        .wifi(true)
        .bluetooth(false)
        .build()?;
    show(out, "6. Custom Computer (fluent builder)", &custom);

    // A preset is a starting point; the builder is a plain value, so it can be
    // cloned and tweaked.
    let office = ComputerBuilder::standard_office();
    let upgraded = office.clone().ram(32).gpu("NVIDIA T1000").build()?;
    let original = office.build()?;
    narrate!(
        out,
        "Office RAM: {} GB -> upgraded {} GB ({})",
        original.ram_gb,
        upgraded.ram_gb,
        upgraded.gpu
    );
    Ok(())
}

fn validation_demo(out: &Narrator) -> Result<()> {
    out.blank();
    out.say("7. Validation:");
    out.say("-".repeat(40));
    let attempts = [
        ("No parts at all", ComputerBuilder::new()),
        ("CPU only", ComputerBuilder::new().cpu("Intel i3-12100")),
        ("Too little RAM", ComputerBuilder::standard_office().ram(2)),
        ("Empty disk", ComputerBuilder::standard_office().storage(0, "SSD")),
    ];
    for (label, builder) in attempts {
        narrate!(out, "{label}:");
        if let Some(computer) = builder.build().or_narrate(out)? {
            narrate!(out, "Built unexpectedly: {}", computer.cpu);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Builder", |out, _config| {
        presets_demo(out)?;
        custom_demo(out)?;
        validation_demo(out)?;
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin builder)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_specification() {
        let pc = ComputerBuilder::high_end_gaming().build().unwrap();
        let spec = pc.to_string();
        assert!(spec.starts_with("Computer Specifications:\n  CPU: Intel i9-13900K"));
        assert!(spec.contains("  Storage: 2000 GB NVMe SSD"));
        assert!(spec.contains("  OS: Windows 11"));
        assert!(spec.ends_with("  Peripherals: Gaming Keyboard, Gaming Mouse, 144Hz Monitor"));
    }

    #[test]
    fn test_optional_parts() {
        let server = ComputerDirector.construct(Preset::HomeServer).unwrap();
        assert_eq!(server.gpu, "Integrated Graphics");
        assert!(server.peripherals.is_empty());
        let spec = server.to_string();
        assert!(spec.contains("  WiFi: Disabled"));
        assert!(!spec.contains("Peripherals"));

        let no_os = ComputerBuilder::high_end_gaming();
        let no_os = ComputerBuilder { operating_system: None, ..no_os }.build().unwrap();
        assert!(!no_os.to_string().contains("OS:"));
    }

    #[test]
    fn test_director_presets() {
        let director = ComputerDirector;
        let budget = director.construct(Preset::BudgetGaming).unwrap();
        assert_eq!(budget.gpu, "NVIDIA RTX 3060");
        assert!(budget.wifi && !budget.bluetooth);
        let workstation = director.construct(Preset::Workstation).unwrap();
        assert_eq!(workstation.ram_gb, 64);
        assert_eq!(workstation.peripherals.len(), 3);
    }

    #[test]
    fn test_missing_parts_are_reported() {
        let err = ComputerBuilder::new().cpu("x").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            err.to_string(),
            "Cannot build computer, missing: RAM, storage, motherboard, power supply"
        );
    }

    #[test]
    fn test_range_checks() {
        let low = ComputerBuilder::standard_office().ram(2).build().unwrap_err();
        assert_eq!(low.to_string(), "Invalid argument: RAM must be between 4 and 2048 GB, got 2");
        assert!(ComputerBuilder::standard_office().ram(4096).build().is_err());
        assert!(ComputerBuilder::standard_office().ram(4).build().is_ok());
        assert!(ComputerBuilder::standard_office().storage(0, "SSD").build().is_err());
    }

    #[test]
    fn test_later_setters_override() {
        let pc = ComputerBuilder::standard_office().cpu("Intel i7-12700").build().unwrap();
        assert_eq!(pc.cpu, "Intel i7-12700");
        assert_eq!(pc.peripherals.len(), 3);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        presets_demo(&out).unwrap();
        custom_demo(&out).unwrap();
        validation_demo(&out).unwrap();
        assert_eq!(out.count("Computer Specifications:"), 6);
        assert!(out.contains("Office RAM: 16 GB -> upgraded 32 GB (NVIDIA T1000)"));
        assert_eq!(out.count("❌"), 4);
        assert!(!out.contains("Built unexpectedly"));
    }
}
