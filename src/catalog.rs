//! The fixed table of cleanup locations and the strategy each one uses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleaner::{Cleaner, Location, Target};
use crate::config::Config;
use crate::strategies::{RecycleBin, ServiceWipe, TrimNewest, Wipe};

/// Keys of the three temp locations, cleaned together by a quick temp cleanup.
pub const TEMP_KEYS: &[&str] = &["user_temp", "system_temp", "windows_temp"];

/// Platform directories the built-in locations hang off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRoots {
    pub system_root: PathBuf,
    pub program_data: PathBuf,
    pub user_profile: Option<PathBuf>,
    /// `TEMP`; the user temp location only exists when this is set.
    pub user_temp: Option<PathBuf>,
    /// `TMP`, falling back to `<system_root>\Temp`.
    pub system_temp: Option<PathBuf>,
}

impl PlatformRoots {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            system_root: var("SystemRoot").unwrap_or_else(|| PathBuf::from(r"C:\Windows")),
            program_data: var("ProgramData").unwrap_or_else(|| PathBuf::from(r"C:\ProgramData")),
            user_profile: var("USERPROFILE").or_else(dirs::home_dir),
            user_temp: var("TEMP"),
            system_temp: var("TMP"),
        }
    }
}

pub struct Catalog {
    locations: Vec<Location>,
    index: HashMap<String, usize>,
    cleaners: HashMap<String, Arc<dyn Cleaner>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog, for assembling synthetic location sets.
    pub fn new() -> Self {
        Self {
            locations: Vec::new(),
            index: HashMap::new(),
            cleaners: HashMap::new(),
        }
    }

    /// The built-in catalog for this machine.
    pub fn system(config: &Config) -> Self {
        Self::for_roots(&PlatformRoots::from_env(), config)
    }

    /// Add a location with its strategy. A repeated key replaces the earlier
    /// entry in place.
    pub fn register(&mut self, location: Location, cleaner: Arc<dyn Cleaner>) {
        let key = location.key.clone();
        match self.index.get(&key) {
            Some(&i) => self.locations[i] = location,
            None => {
                self.index.insert(key.clone(), self.locations.len());
                self.locations.push(location);
            }
        }
        self.cleaners.insert(key, cleaner);
    }

    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub(crate) fn all_mut(&mut self) -> &mut [Location] {
        &mut self.locations
    }

    pub fn get(&self, key: &str) -> Option<&Location> {
        self.index.get(key).map(|&i| &self.locations[i])
    }

    /// The location and the strategy registered for it.
    pub fn entry(&self, key: &str) -> Option<(&Location, &dyn Cleaner)> {
        let location = self.get(key)?;
        let cleaner = self.cleaners.get(key)?;
        Some((location, cleaner.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.locations.iter().map(|l| l.size_bytes).sum()
    }

    pub fn total_files(&self) -> u64 {
        self.locations.iter().map(|l| l.file_count).sum()
    }

    pub fn for_roots(roots: &PlatformRoots, config: &Config) -> Self {
        let mut catalog = Self::new();
        let wipe: Arc<dyn Cleaner> = Arc::new(Wipe);
        let sys = &roots.system_root;

        if let Some(temp) = &roots.user_temp {
            catalog.register(
                Location::new("user_temp", "User Temporary Files", Target::Dir(temp.clone()), "Temporary Files")
                    .describe("Temporary files created by applications for current user"),
                wipe.clone(),
            );
        }

        let system_temp = roots.system_temp.clone().unwrap_or_else(|| sys.join("Temp"));
        catalog.register(
            Location::new("system_temp", "System Temporary Files", Target::Dir(system_temp), "Temporary Files")
                .describe("System-wide temporary files")
                .admin(),
            wipe.clone(),
        );
        catalog.register(
            Location::new("windows_temp", "Windows Temp Directory", Target::Dir(sys.join("Temp")), "Temporary Files")
                .describe("Windows system temporary files")
                .admin(),
            wipe.clone(),
        );

        catalog.register(
            Location::new("recycle_bin", "Recycle Bin", Target::RecycleBin, "Recycle Bin")
                .describe("Files in Recycle Bin for all users")
                .admin()
                .confirm_first(),
            Arc::new(RecycleBin {
                timeout: config.recycle_bin_timeout(),
            }),
        );

        catalog.register(
            Location::new(
                "windows_update_cache",
                "Windows Update Cache",
                Target::Dir(sys.join("SoftwareDistribution").join("Download")),
                "System Cache",
            )
            .describe("Downloaded Windows Update files")
            .admin(),
            Arc::new(ServiceWipe {
                service: config.update_service.clone(),
                timeout: config.service_timeout(),
            }),
        );
        catalog.register(
            Location::new(
                "windows_update_logs",
                "Windows Update Logs",
                Target::Dir(sys.join("Logs").join("WindowsUpdate")),
                "Log Files",
            )
            .describe("Windows Update log files")
            .admin(),
            wipe.clone(),
        );

        if let Some(profile) = &roots.user_profile {
            let local = profile.join("AppData").join("Local");
            let browsers = [
                (
                    "chrome_cache",
                    "Chrome Cache",
                    under(&local, "Google/Chrome/User Data/Default/Cache"),
                    "Google Chrome browser cache",
                ),
                (
                    "firefox_cache",
                    "Firefox Cache",
                    under(&local, "Mozilla/Firefox/Profiles"),
                    "Mozilla Firefox browser cache",
                ),
                (
                    "edge_cache",
                    "Edge Cache",
                    under(&local, "Microsoft/Edge/User Data/Default/Cache"),
                    "Microsoft Edge browser cache",
                ),
            ];
            for (key, name, path, description) in browsers {
                catalog.register_if_present(key, name, path, "Browser Cache", description, &wipe);
            }
        }

        for (key, name, dir, description) in [
            ("cbs_logs", "CBS Log Files", "Logs/CBS", "Component-Based Servicing log files"),
            ("dism_logs", "DISM Log Files", "Logs/DISM", "DISM operation log files"),
            ("setup_logs", "Setup Log Files", "Panther", "Windows setup and upgrade logs"),
        ] {
            catalog.register(
                Location::new(key, name, Target::Dir(under(sys, dir)), "Log Files")
                    .describe(description)
                    .admin(),
                wipe.clone(),
            );
        }

        if let Some(profile) = &roots.user_profile {
            let local = profile.join("AppData").join("Local");
            catalog.register_if_present(
                "store_cache",
                "Windows Store Cache",
                local.join("Packages"),
                "Application Cache",
                "Windows Store app cache files",
                &wipe,
            );
            catalog.register_if_present(
                "thumbnail_cache",
                "Thumbnail Cache",
                under(&local, "Microsoft/Windows/Explorer"),
                "Application Cache",
                "Windows thumbnail cache files",
                &wipe,
            );
        }

        catalog.register(
            Location::new("prefetch", "Prefetch Files", Target::Dir(sys.join("Prefetch")), "System Cache")
                .describe(&format!("Windows prefetch files (keeps recent {})", config.prefetch_keep))
                .admin(),
            Arc::new(TrimNewest {
                keep: config.prefetch_keep,
                extension: Some("pf".to_string()),
            }),
        );

        catalog.register(
            Location::new("memory_dumps", "Memory Dump Files", Target::Dir(sys.join("Minidump")), "System Files")
                .describe("System crash dump files")
                .admin(),
            wipe.clone(),
        );
        catalog.register(
            Location::new(
                "error_reports",
                "Error Reports",
                Target::Dir(under(&roots.program_data, "Microsoft/Windows/WER")),
                "System Files",
            )
            .describe("Windows Error Reporting files")
            .admin(),
            wipe.clone(),
        );
        catalog.register(
            Location::new(
                "delivery_optimization",
                "Delivery Optimization",
                Target::Dir(under(
                    sys,
                    "ServiceProfiles/NetworkService/AppData/Local/Microsoft/Windows/DeliveryOptimization",
                )),
                "System Cache",
            )
            .describe("Windows Update delivery optimization cache")
            .admin(),
            wipe,
        );

        catalog
    }

    /// Application caches only matter when the application is installed.
    fn register_if_present(
        &mut self,
        key: &str,
        name: &str,
        path: PathBuf,
        category: &str,
        description: &str,
        cleaner: &Arc<dyn Cleaner>,
    ) {
        if !path.is_dir() {
            return;
        }
        self.register(
            Location::new(key, name, Target::Dir(path), category).describe(description),
            cleaner.clone(),
        );
    }
}

/// `base` joined with a `/`-separated relative path, one component at a time.
fn under(base: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(base.to_path_buf(), |path, part| path.join(part))
}
