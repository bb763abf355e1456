use ignore::{Walk, WalkBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::cache::{self, FileScanCache, ScanCache};
use crate::error::{Error, Result};
use crate::models::{NormalizedPath, ScannerKind, Workaround};
use crate::scanner::{ScanHits, Scanner};

/// Dispatches source files to their scanners and keeps the scan cache current.
#[derive(Debug)]
pub struct ScanCoordinator {
    scanners: Vec<Box<dyn Scanner>>,
    by_suffix: HashMap<String, usize>,
    cache: ScanCache,
    clock: fn() -> f64,
}

impl ScanCoordinator {
    /// Build a coordinator from a set of scanners.
    ///
    /// Fails when no scanners are given or when two scanners claim the same
    /// file suffix. Without a cache an empty one is started.
    pub fn new(scanners: Vec<Box<dyn Scanner>>, cache: Option<ScanCache>) -> Result<Self> {
        if scanners.is_empty() {
            return Err(Error::NoScanners);
        }

        let mut by_suffix = HashMap::new();
        for (index, scanner) in scanners.iter().enumerate() {
            for suffix in scanner.handled_suffixes() {
                if by_suffix.contains_key(&suffix) {
                    return Err(Error::OverlappingScanners { suffix });
                }
                by_suffix.insert(suffix, index);
            }
        }

        Ok(Self {
            scanners,
            by_suffix,
            cache: cache.unwrap_or_default(),
            clock: cache::now_timestamp,
        })
    }

    /// Build a coordinator from configured scanner kinds, ignoring repeats
    pub fn from_kinds(kinds: &[ScannerKind], cache: Option<ScanCache>) -> Result<Self> {
        let mut seen = Vec::new();
        for kind in kinds {
            if !seen.contains(kind) {
                seen.push(*kind);
            }
        }
        Self::new(seen.into_iter().map(ScannerKind::build).collect(), cache)
    }

    /// Replace the wall clock used to timestamp fresh scans
    pub fn with_clock(mut self, clock: fn() -> f64) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    pub fn into_cache(self) -> ScanCache {
        self.cache
    }

    /// Lazily walk `root` and yield every workaround below it.
    ///
    /// Files with a fresh cache entry are not opened. Files scanned live have
    /// their cache entry replaced once their last workaround has been pulled.
    /// The first error ends the walk.
    pub fn scan(&mut self, root: &Path) -> Scan<'_> {
        debug!(root = %root.display(), "walking source tree");
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        Scan {
            walker,
            scanners: &self.scanners,
            by_suffix: &self.by_suffix,
            cache: &mut self.cache,
            clock: self.clock,
            current: None,
            finished: false,
        }
    }
}

enum FileScan<'a> {
    Cached(std::vec::IntoIter<Workaround>),
    Live {
        path: NormalizedPath,
        hits: ScanHits<'a>,
        found: Vec<Workaround>,
    },
}

/// Iterator over the workarounds below one root, see [`ScanCoordinator::scan`]
pub struct Scan<'a> {
    walker: Walk,
    scanners: &'a [Box<dyn Scanner>],
    by_suffix: &'a HashMap<String, usize>,
    cache: &'a mut ScanCache,
    clock: fn() -> f64,
    current: Option<FileScan<'a>>,
    finished: bool,
}

impl<'a> Scan<'a> {
    fn start_file(&mut self, path: &Path) -> Result<()> {
        let Some(index) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_suffix.get(ext).copied())
        else {
            return Ok(());
        };
        let key = NormalizedPath::new(path);

        if let Some(cached) = self.cache.get(&key) {
            let last_modified = cache::modified_timestamp(path)?;
            if cached.is_fresh(last_modified) {
                debug!(file = %key, "cache entry is fresh");
                self.current = Some(FileScan::Cached(cached.workarounds.clone().into_iter()));
                return Ok(());
            }
            debug!(file = %key, "cache entry is stale");
        }

        let scanners: &'a [Box<dyn Scanner>] = self.scanners;
        let scanner = &scanners[index];
        debug!(file = %key, scanner = scanner.name(), "scanning file");
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        self.current = Some(FileScan::Live {
            path: key,
            hits: scanner.scan(Box::new(BufReader::new(file))),
            found: Vec::new(),
        });
        Ok(())
    }

    fn finish_file(&mut self) {
        if let Some(FileScan::Live { path, found, .. }) = self.current.take() {
            debug!(file = %path, count = found.len(), "updating cache entry");
            self.cache.insert(
                path,
                FileScanCache {
                    workarounds: found,
                    timestamp: (self.clock)(),
                },
            );
        }
    }

    fn fail(&mut self, err: Error) -> Option<Result<Workaround>> {
        self.current = None;
        self.finished = true;
        Some(Err(err))
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<Workaround>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.current.as_mut() {
                Some(FileScan::Cached(workarounds)) => match workarounds.next() {
                    Some(workaround) => return Some(Ok(workaround)),
                    None => self.current = None,
                },
                Some(FileScan::Live { path, hits, found }) => match hits.next() {
                    Some(Ok((line, url))) => {
                        debug!(file = %path, line, "found workaround");
                        let workaround = Workaround::new(path.clone(), line, url);
                        found.push(workaround.clone());
                        return Some(Ok(workaround));
                    }
                    Some(Err(source)) => {
                        let path = path.to_path_buf();
                        return self.fail(Error::io(path, source));
                    }
                    None => self.finish_file(),
                },
                None => {
                    let entry = match self.walker.next() {
                        Some(Ok(entry)) => entry,
                        Some(Err(err)) => return self.fail(err.into()),
                        None => {
                            self.finished = true;
                            return None;
                        }
                    };
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        continue;
                    }
                    if let Err(err) = self.start_file(entry.path()) {
                        return self.fail(err);
                    }
                }
            }
        }
    }
}
