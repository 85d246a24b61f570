//! Test utilities for relua-lib.
//!
//! In-memory stand-ins for the locator and loader, so executor tests can
//! describe a project as a handful of `(request, location, source)` triples
//! without touching the filesystem.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use async_trait::async_trait;
use mlua::prelude::*;

use crate::execute::{Executor, ExecutorConfig};
use crate::lua::runtime;
use crate::resolve::{ContentLoader, Locator};

/// Identifier used for root frames in tests.
pub const ROOT: &str = "/project/main.lua";

/// Locator backed by a fixed request table. The base is ignored.
#[derive(Debug, Default)]
pub struct MapLocator {
  locations: HashMap<String, PathBuf>,
}

impl Locator for MapLocator {
  fn locate(&self, request: &str, _base: &str) -> Option<PathBuf> {
    self.locations.get(request).cloned()
  }
}

/// Loader backed by an in-memory source table that records every call.
#[derive(Debug, Default)]
pub struct MemoryLoader {
  sources: HashMap<PathBuf, String>,
  calls: RefCell<Vec<PathBuf>>,
  in_flight: Cell<usize>,
  max_in_flight: Cell<usize>,
}

impl MemoryLoader {
  /// Locations loaded so far, in call order.
  pub fn calls(&self) -> Vec<PathBuf> {
    self.calls.borrow().clone()
  }

  /// Largest number of loads that were suspended at the same time.
  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.get()
  }
}

#[async_trait(?Send)]
impl ContentLoader for MemoryLoader {
  async fn load(&self, location: &Path) -> io::Result<String> {
    self.calls.borrow_mut().push(location.to_path_buf());
    self.in_flight.set(self.in_flight.get() + 1);
    self.max_in_flight.set(self.max_in_flight.get().max(self.in_flight.get()));
    // Suspend once so sibling loads interleave like real I/O.
    tokio::task::yield_now().await;
    self.in_flight.set(self.in_flight.get() - 1);
    self
      .sources
      .get(location)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no source for {}", location.display())))
  }
}

/// Builder for an executor over an in-memory project.
#[derive(Default)]
pub struct TestProject {
  locator: MapLocator,
  sources: HashMap<PathBuf, String>,
  config: ExecutorConfig,
}

impl TestProject {
  pub fn new() -> Self {
    Self::default()
  }

  /// Map `request` to `location` and serve `source` from it.
  pub fn module(mut self, request: &str, location: &str, source: &str) -> Self {
    self.sources.insert(PathBuf::from(location), source.to_string());
    self.location(request, location)
  }

  /// Map `request` to `location` without any source behind it.
  pub fn location(mut self, request: &str, location: &str) -> Self {
    self.locator.locations.insert(request.to_string(), PathBuf::from(location));
    self
  }

  pub fn config(mut self, config: ExecutorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn build(self) -> LuaResult<(Rc<Executor>, Rc<MemoryLoader>)> {
    let lua = runtime::create_runtime(&self.config.modules_dir)?;
    let shared = lua.create_table()?;
    let loader = Rc::new(MemoryLoader {
      sources: self.sources,
      calls: RefCell::new(Vec::new()),
      in_flight: Cell::new(0),
      max_in_flight: Cell::new(0),
    });
    let executor = Executor::new(
      lua,
      shared,
      ROOT,
      Rc::new(self.locator),
      Rc::clone(&loader) as Rc<dyn ContentLoader>,
      self.config,
    )?;
    Ok((executor, loader))
  }
}
