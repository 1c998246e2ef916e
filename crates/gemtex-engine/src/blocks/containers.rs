use super::types::{Align, Block, ListKind};

/// An open list and the source column its items start at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListScope {
    pub kind: ListKind,
    pub indent: usize,
}

/// Stack of open lists, innermost last.
///
/// Indentation strictly increases from bottom to top.
#[derive(Debug, Default, Clone)]
pub struct ListStack(pub Vec<ListScope>);

impl ListStack {
    pub fn top(&self) -> Option<ListScope> {
        self.0.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn open(&mut self, kind: ListKind, indent: usize, out: &mut Vec<Block>) {
        self.0.push(ListScope { kind, indent });
        out.push(Block::ListStart(kind));
    }

    /// Closes the innermost list.
    pub fn close(&mut self, out: &mut Vec<Block>) {
        if let Some(scope) = self.0.pop() {
            out.push(Block::ListEnd(scope.kind));
        }
    }

    /// Closes lists while `pred` holds for the innermost one.
    pub fn close_while(&mut self, pred: impl Fn(ListScope) -> bool, out: &mut Vec<Block>) {
        while self.top().is_some_and(&pred) {
            self.close(out);
        }
    }

    pub fn close_all(&mut self, out: &mut Vec<Block>) {
        self.close_while(|_| true, out);
    }

    /// Places an item of `kind` at `indent`, opening and closing lists so the
    /// stack top matches it.
    pub fn enter_item(&mut self, kind: ListKind, indent: usize, out: &mut Vec<Block>) {
        self.close_while(|scope| indent < scope.indent, out);

        match self.top() {
            Some(scope) if scope.indent == indent && scope.kind != kind => {
                self.close(out);
                self.open(kind, indent, out);
            }
            Some(scope) if scope.indent >= indent => {}
            _ => self.open(kind, indent, out),
        }
    }
}

/// An open pipe table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    /// One entry per column.
    pub aligns: Vec<Align>,
}

impl TableState {
    /// Opens a table whose width is fixed by the header row.
    pub fn new(mut aligns: Vec<Align>, columns: usize) -> Self {
        aligns.resize(columns, Align::Left);
        Self { aligns }
    }

    pub fn columns(&self) -> usize {
        self.aligns.len()
    }

    /// Pads or truncates a data row to the header's cell count.
    pub fn fit_row(&self, cells: &[&str]) -> Vec<String> {
        (0..self.columns())
            .map(|i| cells.get(i).copied().unwrap_or_default().to_string())
            .collect()
    }
}
