use crate::domain::errors::{DiffError, Result};
use crate::domain::print_spec::PrintSpec;
use crate::domain::table::Table;

/// An ordered set of tables plus their print specification.
///
/// Table `i + 1` is the child level of table `i`: a child row belongs to the
/// parent row whose key values equal the leading values of the child's key.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: Vec<Table>,
    print_spec: PrintSpec,
}

impl Dataset {
    pub fn new(tables: Vec<Table>, print_spec: PrintSpec) -> Self {
        Self { tables, print_spec }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn print_spec(&self) -> &PrintSpec {
        &self.print_spec
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every child level's key must extend its parent's key.
    pub fn ensure_hierarchy(&self) -> Result<()> {
        for pair in self.tables.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            if child.primary_key().len() < parent.primary_key().len() {
                return Err(DiffError::invalid(format!(
                    "child table `{}` has a shorter key than its parent `{}`",
                    child.name(),
                    parent.name()
                )));
            }
        }
        Ok(())
    }
}
