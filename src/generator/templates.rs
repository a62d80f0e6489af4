use askama::Template;

/// A middleware with a known context output shape, exposed as its own procedure builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareBuilder {
    /// Class name of the middleware
    pub name: String,
    /// Builder identifier in the generated file, e.g. `authMiddlewareProcedure`
    pub builder: String,
    /// Context output shape, without the braces
    pub shape: String,
}

/// One nested router of the app router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterEntry {
    /// Key under which the router is mounted
    pub key: String,
    /// Synthesized procedure definitions
    pub procedures: Vec<String>,
}

/// Template data for the generated app router module
#[derive(Template)]
#[template(path = "app_router.ts.txt", escape = "none")]
pub struct AppRouterTemplateData {
    /// Schema builder namespace to import, if any
    pub schema_namespace: Option<String>,
    /// Module the namespace is imported from
    pub schema_import: String,
    pub procedure_builder: String,
    pub middlewares: Vec<MiddlewareBuilder>,
    pub routers: Vec<RouterEntry>,
}

/// Render the app router module, always ending with a newline.
pub fn render_app_router(data: &AppRouterTemplateData) -> anyhow::Result<String> {
    let mut rendered = data.render()?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}
