//! Store dialects for modification command text.

mod mysql;
mod sqlite;

pub use mysql::MysqlSqlGenerator;
pub use sqlite::SqliteSqlGenerator;

use crate::sql_generator::SqlGenerator;

/// Stores with a built-in command text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Mysql,
}

/// Create a command text generator for the given dialect.
pub fn generator_for_dialect(dialect: Dialect) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::Sqlite => Box::new(SqliteSqlGenerator),
        Dialect::Mysql => Box::new(MysqlSqlGenerator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_matches_dialect() {
        assert_eq!(generator_for_dialect(Dialect::Sqlite).dialect(), "sqlite");
        assert_eq!(generator_for_dialect(Dialect::Mysql).dialect(), "mysql");
        assert_eq!(generator_for_dialect(Dialect::Mysql).delimit_identifier("a"), "`a`");
    }
}
