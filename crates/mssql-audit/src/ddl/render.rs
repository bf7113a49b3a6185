//! Render statement nodes to script text (Strategy pattern).
//!
//! [`Dialect`] owns every textual decision: quoting, built-in function names,
//! batch separators and layout. [`TsqlDialect`] is the SQL Server rendering.

use crate::core::identifier::{quote_ident, quote_literal};

use super::ast::*;

/// Script text generation for one target engine.
///
/// `render_block` and `render_script` are template methods built on
/// `render_statement` and `batch_separator`.
pub trait Dialect: Send + Sync {
    /// Dialect name (e.g., "tsql").
    fn name(&self) -> &str;

    /// Quote an identifier.
    fn quote_ident(&self, name: &str) -> String;

    /// Marker that ends one independently executable batch.
    fn batch_separator(&self) -> &str;

    /// Render a single statement, without separator or trailing newline.
    fn render_statement(&self, statement: &Statement) -> String;

    /// Quote a schema-qualified object name.
    fn qualify(&self, object: &ObjectName) -> String {
        format!(
            "{}.{}",
            self.quote_ident(&object.schema),
            self.quote_ident(&object.name)
        )
    }

    /// Render a block: each statement followed by the batch separator, then
    /// a blank line.
    fn render_block(&self, block: &Block) -> String {
        let mut out = String::new();
        for statement in &block.statements {
            out.push_str(&self.render_statement(statement));
            out.push('\n');
            out.push_str(self.batch_separator());
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Render all blocks of a table script.
    fn render_script(&self, script: &TableScript) -> String {
        script
            .blocks
            .iter()
            .map(|b| self.render_block(b))
            .collect()
    }
}

/// SQL Server (T-SQL) dialect.
#[derive(Debug, Clone, Default)]
pub struct TsqlDialect;

impl TsqlDialect {
    /// Create a new T-SQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Column {
                qualifier: Some(q),
                name,
            } => format!("{}.{}", self.quote_ident(q), self.quote_ident(name)),
            Expr::Column {
                qualifier: None,
                name,
            } => self.quote_ident(name),
            Expr::ObjectColumn { object, column } => {
                format!("{}.{}", self.qualify(object), self.quote_ident(column))
            }
            Expr::Variable(name) => format!("@{}", name),
            Expr::CharLiteral(c) => quote_literal(&c.to_string()),
            Expr::Int(v) => v.to_string(),
            Expr::Builtin(Builtin::UtcNow) => "GETUTCDATE()".to_string(),
            Expr::Builtin(Builtin::CurrentPrincipal) => "SUSER_SNAME()".to_string(),
            Expr::Max(inner) => format!("MAX({})", self.expr(inner)),
            Expr::CountStar => "COUNT(*)".to_string(),
            Expr::Convert { type_text, expr } => {
                format!("CONVERT({}, {})", type_text, self.expr(expr))
            }
            Expr::Subquery(select) => format!("({})", self.select_inline(select)),
        }
    }

    fn predicate(&self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Eq(a, b) => format!("{} = {}", self.expr(a), self.expr(b)),
            Predicate::IsNull(e) => format!("{} IS NULL", self.expr(e)),
            Predicate::And(items) => items
                .iter()
                .map(|p| match p {
                    Predicate::Or(_) => self.wrapped(p),
                    _ => self.predicate(p),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
            Predicate::Or(items) => items
                .iter()
                .map(|p| self.wrapped(p))
                .collect::<Vec<_>>()
                .join(" OR "),
        }
    }

    fn wrapped(&self, predicate: &Predicate) -> String {
        format!("({})", self.predicate(predicate))
    }

    fn table_ref(&self, table: &TableRef) -> String {
        let source = match &table.source {
            Source::Inserted => self.quote_ident("inserted"),
            Source::Deleted => self.quote_ident("deleted"),
            Source::Object(object) => self.qualify(object),
        };
        match &table.alias {
            Some(alias) => format!("{} AS {}", source, self.quote_ident(alias)),
            None => source,
        }
    }

    fn join_keyword(kind: JoinKind) -> &'static str {
        match kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }

    fn from_list(&self, from: &[TableRef]) -> String {
        from.iter()
            .map(|t| self.table_ref(t))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn projection(&self, select: &Select) -> String {
        select
            .projection
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One-line SELECT, used for subqueries nested in expressions.
    fn select_inline(&self, select: &Select) -> String {
        let mut sql = format!("SELECT {}", self.projection(select));
        if !select.from.is_empty() {
            sql.push_str(&format!(" FROM {}", self.from_list(&select.from)));
        }
        for join in &select.joins {
            sql.push_str(&format!(
                " {} {} ON {}",
                Self::join_keyword(join.kind),
                self.table_ref(&join.table),
                self.predicate(&join.on)
            ));
        }
        if let Some(filter) = &select.filter {
            sql.push_str(&format!(" WHERE {}", self.predicate(filter)));
        }
        sql
    }

    /// Multi-line subquery assignment: one condition per line.
    fn assign_subquery(&self, out: &mut Vec<String>, variable: &str, select: &Select) {
        out.push(format!("SELECT @{} =", variable));
        out.push(format!(
            "  (SELECT {} FROM {}",
            self.projection(select),
            self.from_list(&select.from)
        ));
        for join in &select.joins {
            out.push(format!(
                "    {} {} ON {}",
                Self::join_keyword(join.kind),
                self.table_ref(&join.table),
                self.predicate(&join.on)
            ));
        }
        if let Some(filter) = &select.filter {
            out.push("  WHERE".to_string());
            let conditions: Vec<String> = match filter {
                Predicate::And(items) => items.iter().map(|p| self.wrapped(p)).collect(),
                other => vec![self.wrapped(other)],
            };
            let last = conditions.len().saturating_sub(1);
            for (idx, condition) in conditions.into_iter().enumerate() {
                let sep = if idx < last { " AND" } else { "" };
                out.push(format!("   {}{}", condition, sep));
            }
        }
        out.push("  )".to_string());
    }

    fn insert_select(&self, out: &mut Vec<String>, insert: &InsertSelect, indent: &str) {
        let has_columns = !insert.columns.is_empty();
        let lead_sep = if has_columns { "," } else { "" };

        out.push(format!("{}INSERT {}", indent, self.qualify(&insert.table)));
        out.push(format!("{}(", indent));
        out.push(format!(
            "{}   {}{}",
            indent,
            insert
                .leading_columns
                .iter()
                .map(|c| self.quote_ident(c))
                .collect::<Vec<_>>()
                .join(","),
            lead_sep
        ));
        push_list(
            out,
            &format!("{}   ", indent),
            insert.columns.iter().map(|c| self.quote_ident(c)),
        );
        out.push(format!("{})", indent));

        out.push(format!("{}SELECT", indent));
        out.push(format!(
            "{}   {}{}",
            indent,
            insert
                .leading_values
                .iter()
                .map(|e| self.expr(e))
                .collect::<Vec<_>>()
                .join(","),
            lead_sep
        ));
        push_list(
            out,
            &format!("{}   ", indent),
            insert.values.iter().map(|e| self.expr(e)),
        );

        out.push(format!("{}FROM", indent));
        out.push(format!("{}   {}", indent, self.table_ref(&insert.from)));
        for join in &insert.joins {
            out.push(format!("{}{}", indent, Self::join_keyword(join.kind)));
            out.push(format!(
                "{}   {} ON {}",
                indent,
                self.table_ref(&join.table),
                self.predicate(&join.on)
            ));
        }
    }

    fn trigger_steps(&self, out: &mut Vec<String>, steps: &[TriggerStep], indent: &str) {
        for (idx, step) in steps.iter().enumerate() {
            let next = steps.get(idx + 1);
            match step {
                TriggerStep::Declare {
                    variable,
                    type_text,
                } => {
                    out.push(format!("{}DECLARE @{} {}", indent, variable, type_text));
                    if !matches!(next, Some(TriggerStep::Declare { .. })) {
                        out.push(String::new());
                    }
                }
                TriggerStep::Assign { variable, query } if is_subquery_assign(query) => {
                    if let Some(Expr::Subquery(select)) = query.projection.first() {
                        self.assign_subquery(out, variable, select);
                    }
                }
                TriggerStep::Assign { variable, query } => {
                    let value = query
                        .projection
                        .first()
                        .map(|e| self.expr(e))
                        .unwrap_or_else(|| "NULL".to_string());
                    let mut line = format!("{}SELECT @{} = {}", indent, variable, value);
                    if !query.from.is_empty() {
                        line.push_str(&format!(" FROM {}", self.from_list(&query.from)));
                    }
                    if let Some(filter) = &query.filter {
                        line.push_str(&format!(" WHERE {}", self.predicate(filter)));
                    }
                    out.push(line);
                    let next_is_plain_assign = matches!(
                        next,
                        Some(TriggerStep::Assign { query, .. }) if !is_subquery_assign(query)
                    );
                    if !next_is_plain_assign {
                        out.push(String::new());
                    }
                }
                TriggerStep::Insert(insert) => self.insert_select(out, insert, indent),
                TriggerStep::If { condition, then } => {
                    out.push(format!("{}IF {}", indent, self.predicate(condition)));
                    out.push(format!("{}BEGIN", indent));
                    self.trigger_steps(out, then, &format!("{}  ", indent));
                    out.push(format!("{}END", indent));
                }
            }
        }
    }

    fn create_table(&self, create: &CreateTable) -> String {
        let mut lines = vec![format!("CREATE TABLE {}", self.qualify(&create.table)), "(".into()];
        for column in &create.columns {
            let identity = if column.identity { " IDENTITY(1,1)" } else { "" };
            let null = if column.nullable { "NULL" } else { "NOT NULL" };
            lines.push(format!(
                "   {} {}{} {},",
                self.quote_ident(&column.name),
                column.type_text,
                identity,
                null
            ));
        }
        let pk = &create.primary_key;
        lines.push(format!(
            "   CONSTRAINT {} PRIMARY KEY {} ({} ASC)",
            self.quote_ident(&pk.name),
            if pk.clustered { "CLUSTERED" } else { "NONCLUSTERED" },
            self.quote_ident(&pk.column)
        ));
        lines.push(")".into());
        lines.join("\n")
    }

    fn create_trigger(&self, trigger: &CreateTrigger) -> String {
        let event = match trigger.event {
            DmlEvent::Insert => "INSERT",
            DmlEvent::Update => "UPDATE",
            DmlEvent::Delete => "DELETE",
        };
        let mut lines = vec![
            format!(
                "CREATE TRIGGER {} ON {} AFTER {}",
                self.qualify(&trigger.name),
                self.qualify(&trigger.table),
                event
            ),
            "AS".to_string(),
            String::new(),
        ];
        self.trigger_steps(&mut lines, &trigger.body, "");
        lines.join("\n")
    }
}

impl Dialect for TsqlDialect {
    fn name(&self) -> &str {
        "tsql"
    }

    fn quote_ident(&self, name: &str) -> String {
        quote_ident(name)
    }

    fn batch_separator(&self) -> &str {
        "GO"
    }

    fn render_statement(&self, statement: &Statement) -> String {
        match statement {
            Statement::DropIfExists { kind, object } => {
                let (code, keyword) = match kind {
                    ObjectKind::Table => ("U", "TABLE"),
                    ObjectKind::Trigger => ("TR", "TRIGGER"),
                };
                let name = self.qualify(object);
                format!(
                    "IF OBJECT_ID({}, {}) IS NOT NULL DROP {} {};",
                    quote_literal(&name),
                    quote_literal(code),
                    keyword,
                    name
                )
            }
            Statement::DropIndexIfExists { index, table } => {
                let table_name = self.qualify(table);
                format!(
                    "IF EXISTS (SELECT * FROM sys.indexes WHERE object_id = OBJECT_ID({}) AND name = {}) DROP INDEX {} ON {};",
                    quote_literal(&table_name),
                    quote_literal(index),
                    self.quote_ident(index),
                    table_name
                )
            }
            Statement::CreateTable(create) => self.create_table(create),
            Statement::AddDefault {
                table,
                constraint,
                column,
                value,
            } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT ({}) FOR {}",
                self.qualify(table),
                self.quote_ident(constraint),
                self.expr(value),
                self.quote_ident(column)
            ),
            Statement::CreateIndex {
                index,
                table,
                column,
                clustered,
            } => format!(
                "CREATE {} INDEX {} ON {} ({} ASC)",
                if *clustered { "CLUSTERED" } else { "NONCLUSTERED" },
                self.quote_ident(index),
                self.qualify(table),
                self.quote_ident(column)
            ),
            Statement::CreateTrigger(trigger) => self.create_trigger(trigger),
        }
    }
}

fn is_subquery_assign(query: &Select) -> bool {
    query.from.is_empty() && matches!(query.projection.first(), Some(Expr::Subquery(_)))
}

/// Push items one per line, comma-terminated except the last.
fn push_list(out: &mut Vec<String>, prefix: &str, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    let last = items.len().saturating_sub(1);
    for (idx, item) in items.into_iter().enumerate() {
        let sep = if idx < last { "," } else { "" };
        out.push(format!("{}{}{}", prefix, item, sep));
    }
}
