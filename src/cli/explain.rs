//! CLI `explain` command: show the clauses and predicate a query produces.

use anyhow::Result;

use reprise::query::{compile, tokenize, ParseError};

pub fn explain(query: &str) -> Result<()> {
    let clauses = match tokenize(query) {
        Ok(clauses) => clauses,
        Err(ParseError::Overquoted { prefix }) => {
            println!("Parse error: too many quotes in {prefix:?}");
            println!("Escape inner quotes with \\\" or drop the surrounding quotes.");
            return Ok(());
        }
    };

    println!("Clauses:");
    if clauses.is_empty() {
        println!("  (none, matches every card)");
    }
    for clause in &clauses {
        println!(
            "  sign={:<2} key={:<16} op={:<3} value={}",
            clause.sign.as_str(),
            format!("{:?}", clause.key),
            clause.op.as_str(),
            format!("{:?}", clause.value),
        );
    }
    println!();

    let compiled = compile(&clauses);
    println!("Predicate:");
    println!("  {}", compiled.predicate);
    if compiled.joins.template || compiled.joins.model {
        println!();
        println!(
            "Joins: template={} model={}",
            compiled.joins.template, compiled.joins.model
        );
    }

    Ok(())
}
