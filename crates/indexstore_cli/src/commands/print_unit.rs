//! Print-unit command implementation.

use super::{emit, OutputFormat};
use indexstore_core::{IndexStoreResult, Store, UnitInfo};
use serde::Serialize;

/// A unit as printed.
#[derive(Debug, Serialize)]
pub struct UnitDump {
    /// Unit name.
    pub name: String,
    /// Producer and version.
    pub provider: String,
    /// Modification time as `seconds.nanoseconds`.
    pub modification_time: String,
    /// System unit flag.
    pub is_system: bool,
    /// Module unit flag.
    pub is_module: bool,
    /// Debug compilation flag.
    pub is_debug: bool,
    /// Main file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    /// Module name.
    pub module_name: String,
    /// Working directory.
    pub working_dir: String,
    /// Output file.
    pub output_file: String,
    /// Sysroot.
    pub sysroot_path: String,
    /// Target triple.
    pub target: String,
    /// Dependencies in store order.
    pub dependencies: Vec<DependencyDump>,
    /// Includes in store order.
    pub includes: Vec<IncludeDump>,
}

/// A dependency as printed.
#[derive(Debug, Serialize)]
pub struct DependencyDump {
    /// Kind name, or the raw value if unknown.
    pub kind: String,
    /// System flag.
    pub is_system: bool,
    /// Unit or record name.
    pub name: String,
    /// File path.
    pub file_path: String,
    /// Module name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub module_name: String,
}

/// An include as printed.
#[derive(Debug, Serialize)]
pub struct IncludeDump {
    /// `path:line` of the directive.
    pub source: String,
    /// Included file.
    pub target: String,
}

impl From<UnitInfo> for UnitDump {
    fn from(unit: UnitInfo) -> Self {
        Self {
            name: unit.name,
            provider: format!("{} {}", unit.provider_identifier, unit.provider_version),
            modification_time: unit.modification_time.to_string(),
            is_system: unit.is_system_unit,
            is_module: unit.is_module_unit,
            is_debug: unit.is_debug_compilation,
            main_file: unit.main_file,
            module_name: unit.module_name,
            working_dir: unit.working_dir,
            output_file: unit.output_file,
            sysroot_path: unit.sysroot_path,
            target: unit.target,
            dependencies: unit
                .dependencies
                .into_iter()
                .map(|dep| DependencyDump {
                    kind: dep
                        .kind
                        .map_or_else(|| dep.raw_kind.to_string(), |kind| kind.to_string()),
                    is_system: dep.is_system,
                    name: dep.name,
                    file_path: dep.file_path,
                    module_name: dep.module_name,
                })
                .collect(),
            includes: unit
                .includes
                .into_iter()
                .map(|include| IncludeDump {
                    source: format!("{}:{}", include.source_path, include.source_line),
                    target: include.target_path,
                })
                .collect(),
        }
    }
}

/// Reads the named unit, or every unit in name order.
pub fn collect(store: &Store, name: Option<&str>) -> IndexStoreResult<Vec<UnitDump>> {
    let names = match name {
        Some(name) => vec![name.to_owned()],
        None => store.unit_names(true)?,
    };
    names
        .iter()
        .map(|name| Ok(store.unit_reader(name)?.info()?.into()))
        .collect()
}

/// Runs the print-unit command.
pub fn run(
    store: &Store,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let units = collect(store, name)?;
    emit(&units, format, |units| {
        for unit in units {
            print_text(unit);
        }
    })
}

fn print_text(unit: &UnitDump) {
    println!("=== {} ===", unit.name);
    println!("provider:     {}", unit.provider);
    println!("modified:     {}", unit.modification_time);
    println!(
        "flags:        system={} module={} debug={}",
        unit.is_system, unit.is_module, unit.is_debug
    );
    if let Some(main_file) = &unit.main_file {
        println!("main file:    {main_file}");
    }
    if !unit.module_name.is_empty() {
        println!("module:       {}", unit.module_name);
    }
    println!("working dir:  {}", unit.working_dir);
    println!("output file:  {}", unit.output_file);
    println!("sysroot:      {}", unit.sysroot_path);
    println!("target:       {}", unit.target);

    println!("dependencies: {}", unit.dependencies.len());
    for dep in &unit.dependencies {
        let system = if dep.is_system { " (system)" } else { "" };
        let name = if dep.name.is_empty() { "-" } else { dep.name.as_str() };
        println!("  {:<7} {name} | {}{system}", dep.kind, dep.file_path);
    }
    println!("includes:     {}", unit.includes.len());
    for include in &unit.includes {
        println!("  {} -> {}", include.source, include.target);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_testkit::{sample, unit_name_for_output, FakeLibrary, TestStore};

    #[test]
    fn dumps_dependencies_and_includes() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();

        let name = unit_name_for_output(sample::MAIN_OUTPUT);
        let units = collect(&store, Some(&name)).unwrap();
        assert_eq!(units.len(), 1);
        let main = &units[0];
        assert_eq!(main.provider, "clang 17.0.0");
        let kinds: Vec<_> = main.dependencies.iter().map(|dep| dep.kind.as_str()).collect();
        assert_eq!(kinds, vec!["record", "unit", "file"]);
        assert_eq!(main.includes[0].source, "/src/main.c:2");
    }

    #[test]
    fn dumps_every_unit_without_a_name() {
        let test_store = TestStore::sample();
        let library = FakeLibrary::new().load().unwrap();
        let store = test_store.open(&library).unwrap();
        assert_eq!(collect(&store, None).unwrap().len(), 3);
    }
}
