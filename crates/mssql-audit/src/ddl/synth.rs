//! Build the audit table and trigger statements for one table.

use crate::core::{ColumnMetadata, TableAggregate};
use crate::error::{AuditError, Result};
use crate::typemap::{declared_type, lob_comparable_type};

use super::ast::*;

/// Audit type code column.
pub const AUDIT_TYPE_COLUMN: &str = "AuditType";
/// Timestamp column, defaults to the current UTC time.
pub const AUDIT_ON_COLUMN: &str = "AuditOn";
/// Principal column, defaults to the current login.
pub const AUDIT_BY_COLUMN: &str = "AuditBy";

const LAST_ID: &str = "lastId";
const LAST_AUDIT_ID: &str = "lastAuditId";
const IS_SAME: &str = "isSame";

// Row aliases used inside trigger bodies
const INSERTED: &str = "i";
const DELETED: &str = "d";
const CURRENT: &str = "c";
const LAST_AUDIT: &str = "l";

/// Object and constraint names derived from the source table name.
#[derive(Debug, Clone)]
pub struct AuditNames {
    pub source: ObjectName,
    pub audit_table: ObjectName,
    pub audit_id: String,
    pub primary_key: String,
    pub default_audit_on: String,
    pub default_audit_by: String,
    pub on_delete: ObjectName,
    pub on_insert: ObjectName,
    pub on_update: ObjectName,
}

impl AuditNames {
    pub fn for_table(table: &TableAggregate) -> Self {
        let schema = table.schema();
        let name = table.name();
        let audit = format!("{}Audit", name);
        Self {
            source: ObjectName::new(schema, name),
            audit_table: ObjectName::new(schema, &audit),
            audit_id: format!("{}Id", audit),
            primary_key: format!("PK_{}", audit),
            default_audit_on: format!("DF_{}_{}", audit, AUDIT_ON_COLUMN),
            default_audit_by: format!("DF_{}_{}", audit, AUDIT_BY_COLUMN),
            on_delete: ObjectName::new(schema, format!("{}OnDelete", name)),
            on_insert: ObjectName::new(schema, format!("{}OnInsert", name)),
            on_update: ObjectName::new(schema, format!("{}OnUpdate", name)),
        }
    }

    /// Index on the audit table's copy of the identity column.
    pub fn identity_index(&self, identity_column: &str) -> String {
        format!("IX_{}_{}", self.audit_table.name, identity_column)
    }
}

/// Per-table context for trigger synthesis.
struct Synth<'a> {
    table: &'a TableAggregate,
    names: AuditNames,
    /// Identity column name, present only for tables with LOB columns.
    lob_key: Option<&'a str>,
}

/// Synthesize every statement for an already validated table.
///
/// # Errors
///
/// Returns `AuditError::Contract` if a table with LOB columns reaches this
/// point without a single identity column.
pub fn synthesize_table(table: &TableAggregate) -> Result<TableScript> {
    let synth = Synth::new(table)?;
    Ok(TableScript {
        table: synth.names.source.clone(),
        blocks: vec![
            synth.drop_triggers(),
            synth.drop_audit_table(),
            synth.create_audit_table(),
            synth.delete_trigger(),
            synth.insert_trigger(),
            synth.update_trigger()?,
        ],
    })
}

impl<'a> Synth<'a> {
    fn new(table: &'a TableAggregate) -> Result<Self> {
        let lob_key = if table.has_lob_columns() {
            let identity = table.single_identity().ok_or_else(|| {
                AuditError::Contract(format!(
                    "table '{}' has LOB columns but no single identity column; validate before synthesis",
                    table.full_name()
                ))
            })?;
            Some(identity.column_name.as_str())
        } else {
            None
        };

        Ok(Self {
            table,
            names: AuditNames::for_table(table),
            lob_key,
        })
    }

    fn drop_triggers(&self) -> Block {
        let statements = [&self.names.on_delete, &self.names.on_insert, &self.names.on_update]
            .into_iter()
            .map(|trigger| Statement::DropIfExists {
                kind: ObjectKind::Trigger,
                object: trigger.clone(),
            })
            .collect();
        Block { statements }
    }

    fn drop_audit_table(&self) -> Block {
        let mut statements = Vec::new();
        if let Some(key) = self.lob_key {
            statements.push(Statement::DropIndexIfExists {
                index: self.names.identity_index(key),
                table: self.names.audit_table.clone(),
            });
        }
        statements.push(Statement::DropIfExists {
            kind: ObjectKind::Table,
            object: self.names.audit_table.clone(),
        });
        Block { statements }
    }

    fn create_audit_table(&self) -> Block {
        let mut columns = vec![
            ColumnDef {
                name: self.names.audit_id.clone(),
                type_text: "bigint".into(),
                identity: true,
                nullable: false,
            },
            ColumnDef {
                name: AUDIT_TYPE_COLUMN.into(),
                type_text: "char(1)".into(),
                identity: false,
                nullable: false,
            },
            ColumnDef {
                name: AUDIT_ON_COLUMN.into(),
                type_text: "datetime".into(),
                identity: false,
                nullable: false,
            },
            ColumnDef {
                name: AUDIT_BY_COLUMN.into(),
                type_text: "nvarchar(50)".into(),
                identity: false,
                nullable: false,
            },
        ];

        // LOB copies may be missing (no prior snapshot), so they are always nullable
        columns.extend(self.table.columns().iter().map(|c| ColumnDef {
            name: c.column_name.clone(),
            type_text: declared_type(c),
            identity: false,
            nullable: c.is_nullable || c.is_lob(),
        }));

        let mut statements = vec![
            Statement::CreateTable(CreateTable {
                table: self.names.audit_table.clone(),
                columns,
                primary_key: PrimaryKey {
                    name: self.names.primary_key.clone(),
                    column: self.names.audit_id.clone(),
                    clustered: true,
                },
            }),
            Statement::AddDefault {
                table: self.names.audit_table.clone(),
                constraint: self.names.default_audit_on.clone(),
                column: AUDIT_ON_COLUMN.into(),
                value: Expr::Builtin(Builtin::UtcNow),
            },
            Statement::AddDefault {
                table: self.names.audit_table.clone(),
                constraint: self.names.default_audit_by.clone(),
                column: AUDIT_BY_COLUMN.into(),
                value: Expr::Builtin(Builtin::CurrentPrincipal),
            },
        ];

        if let Some(key) = self.lob_key {
            statements.push(Statement::CreateIndex {
                index: self.names.identity_index(key),
                table: self.names.audit_table.clone(),
                column: key.to_string(),
                clustered: false,
            });
        }

        Block { statements }
    }

    fn delete_trigger(&self) -> Block {
        let mut body = self.last_audit_lookup();

        let mut joins = Vec::new();
        if self.lob_key.is_some() {
            joins.push(Join {
                kind: JoinKind::Left,
                table: TableRef::aliased(
                    Source::Object(self.names.audit_table.clone()),
                    LAST_AUDIT,
                ),
                on: Predicate::Eq(
                    Expr::column(LAST_AUDIT, &self.names.audit_id),
                    Expr::variable(LAST_AUDIT_ID),
                ),
            });
        }

        body.push(TriggerStep::Insert(self.audit_insert(
            DmlEvent::Delete,
            DELETED,
            LAST_AUDIT,
            TableRef::aliased(Source::Deleted, DELETED),
            joins,
        )));

        self.trigger(self.names.on_delete.clone(), DmlEvent::Delete, body)
    }

    fn insert_trigger(&self) -> Block {
        let body = vec![TriggerStep::Insert(self.row_image_insert(DmlEvent::Insert))];
        self.trigger(self.names.on_insert.clone(), DmlEvent::Insert, body)
    }

    fn update_trigger(&self) -> Result<Block> {
        let mut body = self.last_audit_lookup();

        body.push(TriggerStep::Declare {
            variable: IS_SAME.into(),
            type_text: "INT".into(),
        });
        body.push(TriggerStep::Assign {
            variable: IS_SAME.into(),
            query: Select {
                projection: vec![Expr::Subquery(Box::new(self.unchanged_count()?))],
                from: Vec::new(),
                joins: Vec::new(),
                filter: None,
            },
        });
        body.push(TriggerStep::If {
            condition: Predicate::Eq(Expr::variable(IS_SAME), Expr::Int(0)),
            then: vec![TriggerStep::Insert(self.row_image_insert(DmlEvent::Update))],
        });

        Ok(self.trigger(self.names.on_update.clone(), DmlEvent::Update, body))
    }

    /// `COUNT(*)` of inserted/deleted pairs where no column changed.
    fn unchanged_count(&self) -> Result<Select> {
        let mut joins = Vec::new();
        if let Some(key) = self.lob_key {
            joins.push(Join {
                kind: JoinKind::Left,
                table: TableRef::aliased(
                    Source::Object(self.names.audit_table.clone()),
                    LAST_AUDIT,
                ),
                on: Predicate::Eq(
                    Expr::column(LAST_AUDIT, &self.names.audit_id),
                    Expr::variable(LAST_AUDIT_ID),
                ),
            });
            joins.push(Join {
                kind: JoinKind::Inner,
                table: TableRef::aliased(Source::Object(self.names.source.clone()), CURRENT),
                on: Predicate::Eq(Expr::column(CURRENT, key), Expr::variable(LAST_ID)),
            });
        }

        let conditions = self
            .table
            .columns()
            .iter()
            .map(unchanged_condition)
            .collect::<Result<Vec<_>>>()?;

        Ok(Select {
            projection: vec![Expr::CountStar],
            from: vec![
                TableRef::aliased(Source::Inserted, INSERTED),
                TableRef::aliased(Source::Deleted, DELETED),
            ],
            joins,
            filter: if conditions.is_empty() {
                None
            } else {
                Some(Predicate::And(conditions))
            },
        })
    }

    /// Audit insert for insert/update: values from `inserted`, LOB values
    /// re-read from the live table.
    fn row_image_insert(&self, event: DmlEvent) -> InsertSelect {
        let mut joins = Vec::new();
        if let Some(key) = self.lob_key {
            joins.push(Join {
                kind: JoinKind::Inner,
                table: TableRef::aliased(Source::Object(self.names.source.clone()), CURRENT),
                on: Predicate::Eq(Expr::column(CURRENT, key), Expr::column(INSERTED, key)),
            });
        }
        self.audit_insert(
            event,
            INSERTED,
            CURRENT,
            TableRef::aliased(Source::Inserted, INSERTED),
            joins,
        )
    }

    fn audit_insert(
        &self,
        event: DmlEvent,
        row_alias: &str,
        lob_alias: &str,
        from: TableRef,
        joins: Vec<Join>,
    ) -> InsertSelect {
        let columns = self.table.columns();
        InsertSelect {
            table: self.names.audit_table.clone(),
            leading_columns: vec![
                AUDIT_TYPE_COLUMN.into(),
                AUDIT_ON_COLUMN.into(),
                AUDIT_BY_COLUMN.into(),
            ],
            leading_values: vec![
                Expr::CharLiteral(event.audit_code()),
                Expr::Builtin(Builtin::UtcNow),
                Expr::Builtin(Builtin::CurrentPrincipal),
            ],
            columns: columns.iter().map(|c| c.column_name.clone()).collect(),
            values: columns
                .iter()
                .map(|c| {
                    let alias = if c.is_lob() { lob_alias } else { row_alias };
                    Expr::column(alias, &c.column_name)
                })
                .collect(),
            from,
            joins,
        }
    }

    /// `@lastId` / `@lastAuditId` lookup of the newest audit row for the
    /// affected entity. Empty for tables without LOB columns.
    fn last_audit_lookup(&self) -> Vec<TriggerStep> {
        let Some(key) = self.lob_key else {
            return Vec::new();
        };

        vec![
            TriggerStep::Declare {
                variable: LAST_ID.into(),
                type_text: "BIGINT".into(),
            },
            TriggerStep::Declare {
                variable: LAST_AUDIT_ID.into(),
                type_text: "BIGINT".into(),
            },
            TriggerStep::Assign {
                variable: LAST_ID.into(),
                query: Select {
                    projection: vec![Expr::bare_column(key)],
                    from: vec![TableRef::plain(Source::Deleted)],
                    joins: Vec::new(),
                    filter: None,
                },
            },
            TriggerStep::Assign {
                variable: LAST_AUDIT_ID.into(),
                query: Select {
                    projection: vec![Expr::Max(Box::new(Expr::bare_column(
                        &self.names.audit_id,
                    )))],
                    from: vec![TableRef::plain(Source::Object(self.names.audit_table.clone()))],
                    joins: Vec::new(),
                    filter: Some(Predicate::Eq(
                        Expr::ObjectColumn {
                            object: self.names.audit_table.clone(),
                            column: key.to_string(),
                        },
                        Expr::variable(LAST_ID),
                    )),
                },
            },
        ]
    }

    fn trigger(&self, name: ObjectName, event: DmlEvent, body: Vec<TriggerStep>) -> Block {
        Block {
            statements: vec![Statement::CreateTrigger(CreateTrigger {
                name,
                table: self.names.source.clone(),
                event,
                body,
            })],
        }
    }
}

/// Condition that holds when a column did not change in an update.
///
/// Ordinary columns compare `inserted` to `deleted`; LOB columns compare the
/// live row to the last audit snapshot after converting to a comparable type.
fn unchanged_condition(column: &ColumnMetadata) -> Result<Predicate> {
    let name = &column.column_name;
    if column.is_lob() {
        let ty = lob_comparable_type(column)?;
        return Ok(Predicate::Or(vec![
            Predicate::Eq(
                Expr::convert(ty, Expr::column(CURRENT, name)),
                Expr::convert(ty, Expr::column(LAST_AUDIT, name)),
            ),
            Predicate::And(vec![
                Predicate::IsNull(Expr::column(CURRENT, name)),
                Predicate::IsNull(Expr::column(LAST_AUDIT, name)),
            ]),
        ]));
    }

    let (new, old) = (Expr::column(INSERTED, name), Expr::column(DELETED, name));
    if column.is_nullable {
        Ok(Predicate::null_safe_eq(new, old))
    } else {
        Ok(Predicate::Eq(new, old))
    }
}
