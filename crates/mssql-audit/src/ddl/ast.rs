//! Typed statement nodes for audit DDL.
//!
//! The synthesizer builds these; a [`Dialect`](super::Dialect) turns them into
//! text. Nothing in here knows about quoting or batch separators.

/// Schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    pub schema: String,
    pub name: String,
}

impl ObjectName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Object kinds that can be dropped by existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Trigger,
}

/// DML event a trigger fires after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlEvent {
    Insert,
    Update,
    Delete,
}

impl DmlEvent {
    /// Single-character code stored in the audit type column.
    pub fn audit_code(self) -> char {
        match self {
            DmlEvent::Insert => 'I',
            DmlEvent::Update => 'U',
            DmlEvent::Delete => 'D',
        }
    }
}

/// Built-in scalar functions the generated code calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Current UTC timestamp.
    UtcNow,
    /// Login name of the current principal.
    CurrentPrincipal,
}

/// Scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `[alias].[column]`, or `[column]` without a qualifier.
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// `[schema].[object].[column]`.
    ObjectColumn { object: ObjectName, column: String },
    /// `@name`.
    Variable(String),
    /// Single-character string literal.
    CharLiteral(char),
    Int(i64),
    Builtin(Builtin),
    Max(Box<Expr>),
    CountStar,
    Convert { type_text: String, expr: Box<Expr> },
    Subquery(Box<Select>),
}

impl Expr {
    pub fn column(qualifier: &str, name: &str) -> Self {
        Expr::Column {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        }
    }

    pub fn bare_column(name: &str) -> Self {
        Expr::Column {
            qualifier: None,
            name: name.to_string(),
        }
    }

    pub fn variable(name: &str) -> Self {
        Expr::Variable(name.to_string())
    }

    pub fn convert(type_text: &str, expr: Expr) -> Self {
        Expr::Convert {
            type_text: type_text.to_string(),
            expr: Box::new(expr),
        }
    }
}

/// Boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Expr, Expr),
    IsNull(Expr),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `a = b`, or both NULL.
    pub fn null_safe_eq(a: Expr, b: Expr) -> Self {
        Predicate::Or(vec![
            Predicate::Eq(a.clone(), b.clone()),
            Predicate::And(vec![Predicate::IsNull(a), Predicate::IsNull(b)]),
        ])
    }
}

/// Row source in a FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// The `inserted` trigger pseudo-table.
    Inserted,
    /// The `deleted` trigger pseudo-table.
    Deleted,
    Object(ObjectName),
}

/// Row source with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub source: Source,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn aliased(source: Source, alias: &str) -> Self {
        Self {
            source,
            alias: Some(alias.to_string()),
        }
    }

    pub fn plain(source: Source) -> Self {
        Self { source, alias: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Predicate,
}

/// `SELECT projection FROM from[, from...] joins WHERE filter`.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub projection: Vec<Expr>,
    pub from: Vec<TableRef>,
    pub joins: Vec<Join>,
    pub filter: Option<Predicate>,
}

/// Column of a CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub type_text: String,
    pub identity: bool,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub name: String,
    pub column: String,
    pub clustered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: ObjectName,
    pub columns: Vec<ColumnDef>,
    pub primary_key: PrimaryKey,
}

/// `INSERT table (leading..., columns...) SELECT leading..., values... FROM ...`.
///
/// The leading part carries the audit bookkeeping columns; `columns` and
/// `values` mirror the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSelect {
    pub table: ObjectName,
    pub leading_columns: Vec<String>,
    pub leading_values: Vec<Expr>,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,
    pub from: TableRef,
    pub joins: Vec<Join>,
}

/// One statement of a trigger body.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerStep {
    Declare { variable: String, type_text: String },
    /// `SELECT @variable = <first projection> FROM ...`.
    Assign { variable: String, query: Select },
    Insert(InsertSelect),
    If {
        condition: Predicate,
        then: Vec<TriggerStep>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTrigger {
    pub name: ObjectName,
    pub table: ObjectName,
    pub event: DmlEvent,
    pub body: Vec<TriggerStep>,
}

/// Independently executable statement (one batch).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    DropIfExists {
        kind: ObjectKind,
        object: ObjectName,
    },
    DropIndexIfExists {
        index: String,
        table: ObjectName,
    },
    CreateTable(CreateTable),
    AddDefault {
        table: ObjectName,
        constraint: String,
        column: String,
        value: Expr,
    },
    CreateIndex {
        index: String,
        table: ObjectName,
        column: String,
        clustered: bool,
    },
    CreateTrigger(CreateTrigger),
}

/// Statements that belong together in the script.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// Everything generated for one source table, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableScript {
    pub table: ObjectName,
    pub blocks: Vec<Block>,
}

impl TableScript {
    /// All statements across blocks, in order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.blocks.iter().flat_map(|b| b.statements.iter())
    }
}
