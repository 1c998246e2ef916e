use super::{
    classify::{LineClass, LineClassifier},
    containers::{ListStack, TableState},
    types::Block,
};

/// Line-by-line block state machine with one line of lookahead.
pub struct BlockBuilder {
    lists: ListStack,
    table: Option<TableState>,
    out: Vec<Block>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            lists: ListStack::default(),
            table: None,
            out: vec![],
        }
    }

    /// Feeds one line and returns how many lines it consumed (1 or 2).
    pub fn push(&mut self, c: &LineClass, next: Option<&LineClass>) -> usize {
        if c.table_cells.is_none() {
            self.close_table();
        }

        if let Some(index) = c.code {
            self.lists
                .close_while(|scope| scope.indent >= c.indent, &mut self.out);
            self.out.push(Block::Code { index });
            return 1;
        }

        if c.is_blank {
            if self.lists.is_empty() {
                self.out.push(Block::Blank);
            }
            return 1;
        }

        if let Some(marker) = &c.list {
            self.close_table();
            self.lists.enter_item(marker.kind, c.indent, &mut self.out);
            self.out.push(Block::Item {
                kind: marker.kind,
                text: marker.content.trim_end().to_string(),
            });
            return 1;
        }

        if !self.lists.is_empty() {
            self.lists
                .close_while(|scope| scope.indent >= c.indent, &mut self.out);
            if !self.lists.is_empty() {
                self.out.push(Block::Continuation(c.text.trim().to_string()));
                return 1;
            }
        }

        if c.is_rule {
            self.out.push(Block::Rule);
            return 1;
        }

        if let Some((level, text)) = c.heading {
            self.out.push(Block::Heading {
                level,
                text: text.trim().to_string(),
                setext: false,
            });
            return 1;
        }

        if let Some(cells) = &c.table_cells {
            if let Some(table) = &self.table {
                self.out.push(Block::TableRow(table.fit_row(cells)));
                return 1;
            }
            if let Some(aligns) = next.and_then(|n| n.alignment.clone()) {
                let table = TableState::new(aligns, cells.len());
                self.out.push(Block::TableStart(table.aligns.clone()));
                self.out.push(Block::TableHeader(
                    cells.iter().map(|cell| cell.to_string()).collect(),
                ));
                self.table = Some(table);
                return 2;
            }
        }

        if let Some(level) = next.and_then(|n| n.setext_level) {
            self.out.push(Block::Heading {
                level,
                text: c.text.trim().to_string(),
                setext: true,
            });
            return 2;
        }

        self.out.push(Block::Paragraph(c.text.trim().to_string()));
        1
    }

    pub fn finish(mut self) -> Vec<Block> {
        // EOF: lists first, then the table
        self.lists.close_all(&mut self.out);
        self.close_table();
        self.out
    }

    fn close_table(&mut self) {
        if self.table.take().is_some() {
            self.out.push(Block::TableEnd);
        }
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Structures placeholder-bearing lines into blocks.
pub fn structure<S: AsRef<str>>(lines: &[S]) -> Vec<Block> {
    let classes: Vec<LineClass> = lines
        .iter()
        .map(|line| LineClassifier.classify(line.as_ref()))
        .collect();

    let mut builder = BlockBuilder::new();
    let mut i = 0;
    while i < classes.len() {
        i += builder.push(&classes[i], classes.get(i + 1));
    }
    builder.finish()
}
