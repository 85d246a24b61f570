//! Render pipeline over real template trees.

use relua_lib::{ExecutorConfig, RenderError, render_file, render_template};
use serde_json::json;

use super::common::Project;

#[tokio::test]
async fn page_with_partials_and_helpers() -> Result<(), RenderError> {
  let project = Project::new(&[
    (
      "pages/index.lua",
      r#"
        local layout = require('../partials/layout')
        local item = require('../partials/item')
        module.exports = function(locals)
          local rows = {}
          for i, entry in ipairs(locals.items) do
            rows[i] = item(entry)
          end
          return layout(locals.title, table.concat(rows))
        end
      "#,
    ),
    (
      "partials/layout.lua",
      r#"
        module.exports = function(title, body)
          return template.interpolate('<title>{{t}}</title><ul>{{{b}}}</ul>', { t = title, b = body })
        end
      "#,
    ),
    (
      "partials/item.lua",
      r#"
        module.exports = function(entry)
          return '<li class="' .. template.classes({ 'item', done = entry.done }) .. '">'
            .. template.escape(entry.label) .. '</li>'
        end
      "#,
    ),
  ]);

  let locals = json!({
    "title": "Tasks & more",
    "items": [
      { "label": "write <docs>", "done": true },
      { "label": "ship", "done": false }
    ]
  });
  let html = render_file(&project.path("pages/index.lua"), &locals, ExecutorConfig::default()).await?;
  assert_eq!(
    html,
    "<title>Tasks &amp; more</title><ul>\
     <li class=\"item done\">write &lt;docs&gt;</li>\
     <li class=\"item\">ship</li></ul>"
  );
  Ok(())
}

#[tokio::test]
async fn render_time_imports_are_resolved() -> Result<(), RenderError> {
  let project = Project::new(&[
    (
      "page.lua",
      r#"
        module.exports = function(locals)
          local footer = require('./footer')
          return locals.body .. (footer or '')
        end
      "#,
    ),
    ("footer.lua", "module.exports = '<footer/>'"),
  ]);

  let executor = project.executor("page.lua", ExecutorConfig::default())?;
  let html = render_template(&executor, &project.source("page.lua"), &json!({ "body": "<p/>" })).await?;
  assert_eq!(html, "<p/><footer/>");
  Ok(())
}

#[tokio::test]
async fn locals_are_deep_copied() -> Result<(), RenderError> {
  let project = Project::new(&[(
    "page.lua",
    "module.exports = function(locals) locals.nested.value = 'changed'; return locals.nested.value end",
  )]);

  let locals = json!({ "nested": { "value": "original" } });
  let html = render_file(&project.path("page.lua"), &locals, ExecutorConfig::default()).await?;
  assert_eq!(html, "changed");
  assert_eq!(locals["nested"]["value"], "original");
  Ok(())
}
