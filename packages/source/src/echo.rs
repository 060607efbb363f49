//! Client for the ECHO SQL proxy.
//!
//! The proxy accepts a single SQL statement in the `query` parameter and
//! answers with an ISO-8859-1 CSV. Queries are built with [`EchoQuery`],
//! which quotes every identifier and literal so no caller concatenates SQL
//! by hand.

use std::fmt::Write as _;

use crate::SourceError;
use crate::table::{Table, decode_latin1, parse_csv};

/// Quotes a SQL identifier, doubling embedded double quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes a SQL string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Plain(String),
    GeoJson { column: String, alias: String },
}

/// A `SELECT` against one ECHO table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoQuery {
    table: String,
    columns: Vec<Column>,
    conditions: Vec<String>,
}

impl EchoQuery {
    /// Starts a `SELECT * FROM "table"`.
    #[must_use]
    pub fn select(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Restricts the selected columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| Column::Plain(c.as_ref().to_string())));
        self
    }

    /// Selects a geometry column converted to `GeoJSON` text.
    #[must_use]
    pub fn geojson_column(mut self, column: &str, alias: &str) -> Self {
        self.columns.push(Column::GeoJson {
            column: column.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    /// Adds `"column" = 'value'`.
    #[must_use]
    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{} = {}", quote_ident(column), quote_literal(value)));
        self
    }

    /// Adds `"column" IN ('a', 'b', ...)`. An empty list matches nothing.
    #[must_use]
    pub fn where_in<S: AsRef<str>>(mut self, column: &str, values: &[S]) -> Self {
        if values.is_empty() {
            self.conditions.push("1 = 0".to_string());
        } else {
            let list = values
                .iter()
                .map(|v| quote_literal(v.as_ref()))
                .collect::<Vec<_>>()
                .join(", ");
            self.conditions
                .push(format!("{} IN ({list})", quote_ident(column)));
        }
        self
    }

    /// Adds `ST_INTERSECTS(ST_GeomFromText('<wkt>', <srid>), "column")`.
    #[must_use]
    pub fn where_raw_spatial(mut self, column: &str, wkt: &str, srid: u32) -> Self {
        self.conditions.push(format!(
            "ST_INTERSECTS(ST_GeomFromText({}, {srid}), {})",
            quote_literal(wkt),
            quote_ident(column)
        ));
        self
    }

    /// Renders the statement.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let cols = self
                .columns
                .iter()
                .map(|c| match c {
                    Column::Plain(name) => quote_ident(name),
                    Column::GeoJson { column, alias } => format!(
                        "ST_AsGeoJSON({}) AS {}",
                        quote_ident(column),
                        quote_ident(alias)
                    ),
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&cols);
        }
        write!(sql, " FROM {}", quote_ident(&self.table)).ok();
        if !self.conditions.is_empty() {
            write!(sql, " WHERE {}", self.conditions.join(" AND ")).ok();
        }
        sql
    }
}

/// HTTP client for the ECHO proxy.
#[derive(Debug, Clone)]
pub struct EchoClient {
    client: reqwest::Client,
    base_url: String,
}

impl EchoClient {
    /// Client for the proxy at `base_url`, sharing `client`'s connection pool.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Builds `{base}?query=<form-encoded sql>&pg`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if the base URL does not parse.
    pub fn request_url(&self, sql: &str) -> Result<String, SourceError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| SourceError::InvalidUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("query", sql);
        Ok(format!("{url}&pg"))
    }

    /// Runs a query and parses the CSV response.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network failure, a non-2xx status, or an
    /// unparseable body. Nothing is retried.
    pub async fn query(&self, query: &EchoQuery) -> Result<Table, SourceError> {
        let sql = query.to_sql();
        let url = self.request_url(&sql)?;
        log::debug!("ECHO query: {sql}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        let table = parse_csv(&decode_latin1(&bytes))?;
        log::info!("ECHO returned {} rows", table.len());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn select_star_with_filters() {
        let sql = EchoQuery::select("SDWA_PUBLIC_WATER_SYSTEMS_MVIEW")
            .where_eq("STATE", "NJ")
            .to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"SDWA_PUBLIC_WATER_SYSTEMS_MVIEW\" WHERE \"STATE\" = 'NJ'"
        );
    }

    #[test]
    fn where_in_escapes_each_value() {
        let sql = EchoQuery::select("SDWA_VIOLATIONS_MVIEW")
            .where_in("PWSID", &["NJ01", "x') OR ('1'='1"])
            .to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"SDWA_VIOLATIONS_MVIEW\" WHERE \"PWSID\" IN ('NJ01', 'x'') OR (''1''=''1')"
        );
    }

    #[test]
    fn empty_where_in_matches_nothing() {
        let empty: [&str; 0] = [];
        let sql = EchoQuery::select("T").where_in("ID", &empty).to_sql();
        assert_eq!(sql, "SELECT * FROM \"T\" WHERE 1 = 0");
    }

    #[test]
    fn spatial_and_geojson_columns() {
        let sql = EchoQuery::select("wbdhu12")
            .columns(["huc12", "name"])
            .geojson_column("wkb_geometry", "geojson")
            .where_raw_spatial("wkb_geometry", "POLYGON((0 0, 0 1, 1 1, 1 0, 0 0))", 4269)
            .to_sql();
        assert_eq!(
            sql,
            "SELECT \"huc12\", \"name\", ST_AsGeoJSON(\"wkb_geometry\") AS \"geojson\" \
             FROM \"wbdhu12\" WHERE ST_INTERSECTS(ST_GeomFromText('POLYGON((0 0, 0 1, 1 1, 1 0, 0 0))', 4269), \"wkb_geometry\")"
        );
    }

    #[test]
    fn request_url_form_encodes_sql() {
        let client = EchoClient::new(
            reqwest::Client::new(),
            "https://portal.gss.stonybrook.edu/echoepa/",
        );
        let url = client.request_url("select * from \"T\"").unwrap();
        assert_eq!(
            url,
            "https://portal.gss.stonybrook.edu/echoepa/?query=select+*+from+%22T%22&pg"
        );
    }

    #[test]
    fn request_url_rejects_bad_base() {
        let client = EchoClient::new(reqwest::Client::new(), "not a url");
        assert!(matches!(
            client.request_url("x"),
            Err(SourceError::InvalidUrl { .. })
        ));
    }
}
