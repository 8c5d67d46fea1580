//! The fixed set of content tables and the order they sync in.
//!
//! Tables declare the tables they reference; [`Catalog::sync_order`] derives a
//! dependency-respecting order by topological sort, so referenced rows always land before
//! the rows pointing at them.

use crate::column_map::{ColumnEncoding, ColumnMap};
use crate::error::ConfigError;
use crate::table::Table;
use itertools::Itertools;
use std::collections::BTreeSet;

/// One table of the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub depends_on: &'static [&'static str],
    /// Admin API resource serving this table's rows, relative to `/api`.
    pub admin_endpoint: Option<&'static str>,
    pub columns: &'static [(&'static str, ColumnEncoding)],
}

impl TableSpec {
    pub fn table(&self) -> Table {
        Table::new(self.name)
    }

    pub fn column_map(&self) -> ColumnMap {
        ColumnMap::declared(self.columns)
    }
}

const fn spec(
    name: &'static str,
    depends_on: &'static [&'static str],
    admin_endpoint: Option<&'static str>,
) -> TableSpec {
    TableSpec {
        name,
        depends_on,
        admin_endpoint,
        columns: &[],
    }
}

/// The website's content tables, in declaration order.
pub const CONTENT_TABLES: &[TableSpec] = &[
    spec("users", &[], None),
    spec("contact_messages", &["users"], Some("/admin/contact")),
    spec("expertise_content", &[], Some("/admin/content/expertise")),
    spec("service_content", &[], Some("/admin/content/service")),
    spec("client_content", &[], Some("/admin/content/client")),
    spec("project_content", &[], Some("/admin/content/project")),
    spec(
        "project_services",
        &["project_content", "service_content"],
        Some("/admin/content/project-services"),
    ),
    spec("blog_articles", &[], Some("/admin/content/blog")),
    spec(
        "blog_article_services",
        &["blog_articles", "service_content"],
        Some("/admin/content/blog-services"),
    ),
    spec(
        "blog_article_projects",
        &["blog_articles", "project_content"],
        Some("/admin/content/blog-projects"),
    ),
    spec("locations", &[], Some("/admin/locations")),
    spec("about_content", &[], Some("/admin/content/about")),
    spec("footer_content", &[], Some("/admin/content/footer")),
    TableSpec {
        name: "team_members",
        depends_on: &[],
        admin_endpoint: Some("/admin/team"),
        columns: &[("expertise", ColumnEncoding::PostgresArray)],
    },
    spec(
        "team_member_services",
        &["team_members", "service_content"],
        Some("/admin/content/team-services"),
    ),
    spec("hero_slides", &[], Some("/admin/content/hero-slides")),
    spec("impact_stats", &[], Some("/admin/impact")),
];

#[derive(Clone, Debug)]
pub struct Catalog {
    tables: Vec<TableSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(CONTENT_TABLES.to_vec())
    }
}

impl Catalog {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Kahn's algorithm; among tables whose dependencies are met, the one declared first
    /// goes next, which keeps the order stable and readable.
    pub fn sync_order(&self) -> Result<Vec<TableSpec>, ConfigError> {
        let mut remaining_deps = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let mut deps = BTreeSet::new();
            for dep in table.depends_on {
                let index = self
                    .tables
                    .iter()
                    .position(|t| t.name == *dep)
                    .ok_or_else(|| ConfigError::UnknownDependency {
                        table: table.name.to_string(),
                        dependency: dep.to_string(),
                    })?;
                deps.insert(index);
            }
            remaining_deps.push(deps);
        }

        let mut ready: BTreeSet<usize> = remaining_deps
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(i, _)| i)
            .collect();
        let mut done = vec![false; self.tables.len()];
        let mut order = Vec::with_capacity(self.tables.len());

        while let Some(next) = ready.pop_first() {
            done[next] = true;
            order.push(self.tables[next].clone());
            for (i, deps) in remaining_deps.iter_mut().enumerate() {
                if !done[i] && deps.remove(&next) && deps.is_empty() {
                    ready.insert(i);
                }
            }
        }

        if order.len() != self.tables.len() {
            let stuck = self
                .tables
                .iter()
                .zip(done)
                .filter(|(_, done)| !done)
                .map(|(t, _)| t.name)
                .join(", ");
            return Err(ConfigError::Cycle(stuck));
        }
        Ok(order)
    }

    /// The sync order restricted to `names`. An empty filter keeps every table.
    pub fn plan(&self, names: &[String]) -> Result<Vec<TableSpec>, ConfigError> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(ConfigError::UnknownTable(unknown.clone()));
        }
        let order = self.sync_order()?;
        if names.is_empty() {
            return Ok(order);
        }
        Ok(order
            .into_iter()
            .filter(|t| names.iter().any(|n| n == t.name))
            .collect())
    }
}
