//! Executor behavior over filesystem locators and loaders.

use mlua::prelude::*;
use relua_lib::{ExecuteError, ExecutorConfig, FrameState, ResolveError};

use super::common::Project;

type TestResult = Result<(), ExecuteError>;

mod imports {
  use super::*;

  #[tokio::test]
  async fn relative_chain_across_directories() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('./lib/sum')"),
      ("lib/sum.lua", "module.exports = require('./one') + require('../two')"),
      ("lib/one.lua", "module.exports = 1"),
      ("two.lua", "module.exports = 2"),
    ]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let output = executor.execute(&project.source("main.lua"), None, None).await?;
    assert_eq!(output.as_i64(), Some(3));

    let frames = executor.frames();
    assert_eq!(frames.len(), 4);
    assert!(frames.iter().all(|f| f.state == FrameState::Stable));
    Ok(())
  }

  #[tokio::test]
  async fn directory_import_uses_init() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('./widgets').name"),
      ("widgets/init.lua", "exports.name = 'widgets'"),
    ]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let output = executor.execute(&project.source("main.lua"), None, None).await;
    // The first attempt indexes a nil import and raises; the retry succeeds.
    assert_eq!(output?.to_string()?, "widgets");
    assert_eq!(executor.frames()[0].attempts, 2);
    Ok(())
  }

  #[tokio::test]
  async fn nested_script_sees_its_own_dir() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('./sub/where')"),
      ("sub/where.lua", "module.exports = __dir"),
    ]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let output = executor.execute(&project.source("main.lua"), None, None).await?;
    let expected = project.path("sub");
    assert_eq!(output.to_string()?, expected.to_string_lossy());
    Ok(())
  }

  #[tokio::test]
  async fn missing_relative_import_is_not_found() -> TestResult {
    let project = Project::new(&[("main.lua", "module.exports = require('./nope')")]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let err = executor
      .execute(&project.source("main.lua"), None, None)
      .await
      .unwrap_err();
    match err.root_cause() {
      ExecuteError::Resolution(ResolveError::NotFound { request, .. }) => assert_eq!(request, "./nope"),
      other => panic!("unexpected root cause: {}", other),
    }
    Ok(())
  }
}

mod platform_modules {
  use super::*;

  #[tokio::test]
  async fn bare_import_loads_without_frame() -> TestResult {
    let project = Project::new(&[
      ("src/main.lua", "local json = require('fmt')\nmodule.exports = json and json.wrap('x')"),
      ("lua_modules/fmt.lua", "return { wrap = function(s) return '[' .. s .. ']' end }"),
    ]);
    let executor = project.executor("src/main.lua", ExecutorConfig::default())?;

    let output = executor.execute(&project.source("src/main.lua"), None, None).await?;
    assert_eq!(output.to_string()?, "[x]");
    assert_eq!(executor.frames().len(), 1);
    Ok(())
  }

  #[tokio::test]
  async fn platform_module_is_shared_between_importers() -> TestResult {
    let project = Project::new(&[
      (
        "main.lua",
        "local a, b = require('./a'), require('./b')\nmodule.exports = a ~= nil and a == b",
      ),
      ("a.lua", "module.exports = require('state')"),
      ("b.lua", "module.exports = require('state')"),
      ("lua_modules/state.lua", "return {}"),
    ]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let output = executor.execute(&project.source("main.lua"), None, None).await?;
    assert_eq!(output, LuaValue::Boolean(true));
    Ok(())
  }

  #[tokio::test]
  async fn custom_modules_dir() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('greet')"),
      ("vendor/greet.lua", "return 'hi'"),
    ]);
    let config = ExecutorConfig {
      modules_dir: "vendor".to_string(),
      ..ExecutorConfig::default()
    };
    let executor = project.executor("main.lua", config)?;

    let output = executor.execute(&project.source("main.lua"), None, None).await?;
    assert_eq!(output.to_string()?, "hi");
    assert_eq!(executor.frames().len(), 1);
    Ok(())
  }

  #[tokio::test]
  async fn failing_platform_module_fails_the_import() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('broken')"),
      ("lua_modules/broken.lua", "error('platform failure')"),
    ]);
    let executor = project.executor("main.lua", ExecutorConfig::default())?;

    let err = executor
      .execute(&project.source("main.lua"), None, None)
      .await
      .unwrap_err();
    assert!(matches!(
      err.root_cause(),
      ExecuteError::Resolution(ResolveError::Platform { .. })
    ));
    assert!(err.to_string().contains("platform failure"));
    Ok(())
  }
}

mod limits {
  use super::*;

  #[tokio::test]
  async fn import_cycle_hits_depth_limit() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('./ping')"),
      ("ping.lua", "module.exports = require('./pong')"),
      ("pong.lua", "module.exports = require('./ping')"),
    ]);
    let config = ExecutorConfig {
      max_depth: 4,
      ..ExecutorConfig::default()
    };
    let executor = project.executor("main.lua", config)?;

    let err = executor
      .execute(&project.source("main.lua"), None, None)
      .await
      .unwrap_err();
    assert!(matches!(err.root_cause(), ExecuteError::DepthExceeded { depth: 5, .. }));
    assert!(executor.frames().iter().all(|f| f.depth <= 4));
    Ok(())
  }

  #[tokio::test]
  async fn zero_retries_allows_a_single_attempt() -> TestResult {
    let project = Project::new(&[
      ("main.lua", "module.exports = require('./a')"),
      ("a.lua", "module.exports = 1"),
    ]);
    let config = ExecutorConfig {
      max_retry: 0,
      ..ExecutorConfig::default()
    };
    let executor = project.executor("main.lua", config)?;

    let err = executor
      .execute(&project.source("main.lua"), None, None)
      .await
      .unwrap_err();
    assert!(matches!(err, ExecuteError::RetryExhausted { attempts: 1, .. }));
    Ok(())
  }
}
