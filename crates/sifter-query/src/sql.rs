//! SQL rendering of query parts, for inspection and logging.
//!
//! Identifiers are double-quoted per dotted segment, values become `?`
//! placeholders and are returned separately by [`bindings`].

use crate::condition::{Conditions, Predicate};
use crate::join::JoinClause;
use crate::select::Selection;
use crate::value::Value;

/// Quotes a possibly qualified identifier: `a.b` becomes `"a"."b"`.
pub fn quote(identifier: &str) -> String {
    identifier
        .split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("\"{part}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Renders a full select statement.
pub fn render(
    table: &str,
    selections: &[Selection],
    joins: &[JoinClause],
    conditions: &Conditions,
    groups: &[String],
) -> String {
    let columns = if selections.is_empty() {
        "*".to_string()
    } else {
        selections
            .iter()
            .map(render_selection)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("select {columns} from {}", quote(table));
    for join in joins {
        sql.push_str(&format!(
            " {} join {} on {} {} {}",
            join.kind,
            quote(&join.table),
            quote(&join.first),
            join.op,
            quote(&join.second)
        ));
    }
    if !conditions.is_empty() {
        sql.push_str(" where ");
        sql.push_str(&render_conditions(conditions));
    }
    if !groups.is_empty() {
        let groups: Vec<String> = groups.iter().map(|g| quote(g)).collect();
        sql.push_str(" group by ");
        sql.push_str(&groups.join(", "));
    }
    sql
}

fn render_selection(selection: &Selection) -> String {
    let (body, alias) = match selection {
        Selection::Column { column, alias } => (quote(column), alias),
        Selection::Raw { expression, alias } => (expression.clone(), alias),
    };
    match alias {
        Some(alias) => format!("{body} as {}", quote(alias)),
        None => body,
    }
}

/// Renders a condition list without the leading `where`.
pub fn render_conditions(conditions: &Conditions) -> String {
    let mut sql = String::new();
    for (index, (boolean, predicate)) in conditions.items().iter().enumerate() {
        if index > 0 {
            sql.push(' ');
            sql.push_str(boolean.as_str());
            sql.push(' ');
        }
        sql.push_str(&render_predicate(predicate));
    }
    sql
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Compare { column, op, .. } => format!("{} {op} ?", quote(column)),
        Predicate::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // never true for `in`, always true for `not in`
                return if *negated { "1 = 1" } else { "0 = 1" }.to_string();
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            let keyword = if *negated { "not in" } else { "in" };
            format!("{} {keyword} ({placeholders})", quote(column))
        }
        Predicate::Null { column, negated } => {
            let test = if *negated { "is not null" } else { "is null" };
            format!("{} {test}", quote(column))
        }
        Predicate::Group(group) => format!("({})", render_conditions(group)),
    }
}

/// Values bound by the conditions, in placeholder order.
pub fn bindings(conditions: &Conditions) -> Vec<Value> {
    let mut values = Vec::new();
    collect_bindings(conditions, &mut values);
    values
}

fn collect_bindings(conditions: &Conditions, values: &mut Vec<Value>) {
    for (_, predicate) in conditions.items() {
        match predicate {
            Predicate::Compare { value, .. } => values.push(value.clone()),
            Predicate::In { values: list, .. } => values.extend(list.iter().cloned()),
            Predicate::Null { .. } => {}
            Predicate::Group(group) => collect_bindings(group, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Where;
    use crate::join::JoinKind;
    use crate::op::Op;

    #[test]
    fn quoting() {
        assert_eq!(quote("name"), "\"name\"");
        assert_eq!(quote("t.name"), "\"t\".\"name\"");
        assert_eq!(quote("t.*"), "\"t\".*");
    }

    #[test]
    fn full_statement() {
        let mut conditions = Conditions::new();
        conditions
            .where_like("name", "%a%")
            .where_group(|g| {
                g.where_null("b").or_where_eq("b", "");
            })
            .where_in("c", [1, 2]);
        let joins = vec![JoinClause::new(JoinKind::Left, "x", "x.t_id", "t.id")];
        let selections = vec![
            Selection::column("t.c").alias("id"),
            Selection::raw("COUNT(*)").alias("count"),
        ];

        let sql = render("t", &selections, &joins, &conditions, &["t.c".to_string()]);
        insta::assert_snapshot!(sql, @r#"select "t"."c" as "id", COUNT(*) as "count" from "t" left join "x" on "x"."t_id" = "t"."id" where "name" like ? and ("b" is null or "b" = ?) and "c" in (?, ?) group by "t"."c""#);

        assert_eq!(
            bindings(&conditions),
            vec![
                Value::from("%a%"),
                Value::from(""),
                Value::from(1),
                Value::from(2)
            ]
        );
    }

    #[test]
    fn empty_in_lists() {
        let mut conditions = Conditions::new();
        conditions
            .where_in("a", Vec::<i64>::new())
            .where_not_in("b", Vec::<i64>::new())
            .where_cmp("c", Op::Gte, 3);
        assert_eq!(render_conditions(&conditions), "0 = 1 and 1 = 1 and \"c\" >= ?");
    }
}
