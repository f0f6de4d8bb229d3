//! Reserved words that force identifier quoting.

/// Reserved by both supported dialects.
pub(crate) const COMMON: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AUTHORIZATION", "BETWEEN", "BY", "CASE",
    "CHECK", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE",
    "END", "EXCEPT", "EXISTS", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "NOT", "NULL", "OF", "ON",
    "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RIGHT", "SELECT", "SESSION_USER", "SET",
    "SOME", "TABLE", "THEN", "TO", "UNION", "UNIQUE", "UPDATE", "USER", "USING", "VALUES", "WHEN",
    "WHERE", "WITH",
];

/// Reserved only by SQL Server.
pub(crate) const SQL_SERVER: &[&str] = &[
    "BACKUP", "BEGIN", "BREAK", "BROWSE", "BULK", "CLOSE", "CLUSTERED", "COMMIT", "COMPUTE",
    "CONTAINS", "CONTINUE", "CONVERT", "CURSOR", "DATABASE", "DBCC", "DEALLOCATE", "DECLARE",
    "DENY", "DISK", "DUMP", "ERRLVL", "ESCAPE", "EXEC", "EXECUTE", "EXIT", "FILE", "FILLFACTOR",
    "FUNCTION", "GOTO", "HOLDLOCK", "IDENTITY", "IF", "INDEX", "KEY", "KILL", "LINENO", "LOAD",
    "MERGE", "NOCHECK", "NONCLUSTERED", "OPEN", "OPTION", "OUTPUT", "OVER", "PERCENT", "PIVOT",
    "PLAN", "PRINT", "PROC", "PROCEDURE", "PUBLIC", "RAISERROR", "READ", "RESTORE", "RETURN",
    "REVERT", "REVOKE", "ROLLBACK", "ROWCOUNT", "RULE", "SAVE", "SCHEMA", "SHUTDOWN",
    "STATISTICS", "TOP", "TRAN", "TRANSACTION", "TRIGGER", "TRUNCATE", "UNPIVOT", "USE", "VIEW",
    "WAITFOR", "WHILE",
];

/// Reserved only by PostgreSQL.
pub(crate) const POSTGRES: &[&str] = &[
    "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BOTH", "CAST", "COLLATE", "CONCURRENTLY",
    "DEFERRABLE", "DO", "FALSE", "FETCH", "FREEZE", "ILIKE", "INITIALLY", "ISNULL", "LATERAL",
    "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NATURAL", "NOTNULL", "OFFSET", "ONLY",
    "OVERLAPS", "PLACING", "RETURNING", "SIMILAR", "SYMMETRIC", "TABLESAMPLE", "TRAILING", "TRUE",
    "VARIADIC", "VERBOSE", "WINDOW",
];

/// Case-insensitive membership test.
pub(crate) fn contains(list: &[&str], word: &str) -> bool {
    list.iter().any(|k| k.eq_ignore_ascii_case(word))
}
