//! Canonical ordering for diff-stable output.

use super::{RelationId, Schema};

impl Schema {
    /// Sort every entity by name.
    ///
    /// All sorts are stable and case-sensitive, so equal names keep their
    /// insertion order and sorting twice is a no-op.
    pub fn sort(&mut self) {
        for column in self.live_column_ids() {
            let mut parents = self.column(column).parent_relations.clone();
            parents.sort_by(|x, y| {
                self.relation_parent_table_name(*x)
                    .cmp(self.relation_parent_table_name(*y))
            });
            let mut children = self.column(column).child_relations.clone();
            children.sort_by(|x, y| self.relation_table_name(*x).cmp(self.relation_table_name(*y)));

            let c = self.column_mut(column);
            c.parent_relations = parents;
            c.child_relations = children;
        }

        for table in self.table_ids().to_vec() {
            let mut columns = self.table(table).columns.clone();
            columns.sort_by(|x, y| self.column(*x).name.cmp(&self.column(*y).name));

            let t = self.table_mut(table);
            t.columns = columns;
            t.indexes.sort_by(|x, y| x.name.cmp(&y.name));
            t.constraints.sort_by(|x, y| x.name.cmp(&y.name));
            t.triggers.sort_by(|x, y| x.name.cmp(&y.name));
        }

        let mut tables = self.table_ids().to_vec();
        tables.sort_by(|x, y| self.table(*x).name.cmp(&self.table(*y).name));
        self.set_table_ids(tables);

        let mut relations: Vec<RelationId> = self.relation_ids().to_vec();
        relations.sort_by(|x, y| self.relation_table_name(*x).cmp(self.relation_table_name(*y)));
        self.set_relation_ids(relations);
    }
}
