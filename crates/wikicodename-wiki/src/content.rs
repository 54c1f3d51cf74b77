use scraper::{ElementRef, Html, Node};

const LIST_TAGS: [&str; 3] = ["ul", "ol", "dl"];
const ITEM_TAGS: [&str; 2] = ["li", "dt"];

/// One `tbody`: rows of cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    rows: Vec<Vec<Option<String>>>,
}

impl TableBlock {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Trimmed text of the first row's cells, `None` for unreadable cells.
    pub fn headers(&self) -> Vec<Option<String>> {
        self.rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().map(|text| text.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Trimmed non-empty cells of `column` below the header row.
    pub fn values_by_column(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .skip(1)
            .filter_map(|row| row.get(column))
            .filter_map(|cell| cell.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Column values under `header`; exact match first, then the trimmed
    /// header. Empty when no column matches.
    pub fn values_by_header(&self, header: &str) -> Vec<String> {
        let headers = self.headers();
        let position = |wanted: &str| {
            headers
                .iter()
                .position(|candidate| candidate.as_deref() == Some(wanted))
        };
        match position(header).or_else(|| position(header.trim())) {
            Some(column) => self.values_by_column(column),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListItem {
    text: Option<String>,
    has_sublist: bool,
}

/// One `ul`/`ol`/`dl` element and its direct items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBlock {
    items: Vec<ListItem>,
}

impl ListBlock {
    /// Text of every direct item that does not hold a nested list.
    pub fn values(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| !item.has_sublist)
            .filter_map(|item| item.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Tables and lists of one fetched page, in section completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    tables: Vec<TableBlock>,
    lists: Vec<ListBlock>,
}

impl PageContent {
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn tables(&self) -> &[TableBlock] {
        &self.tables
    }

    pub fn lists(&self) -> &[ListBlock] {
        &self.lists
    }

    pub fn table_headers(&self, table: usize) -> Option<Vec<Option<String>>> {
        self.tables.get(table).map(TableBlock::headers)
    }

    pub fn table_values_by_column(&self, table: usize, column: usize) -> Vec<String> {
        self.tables
            .get(table)
            .map(|block| block.values_by_column(column))
            .unwrap_or_default()
    }

    pub fn table_values_by_header(&self, table: usize, header: &str) -> Vec<String> {
        self.tables
            .get(table)
            .map(|block| block.values_by_header(header))
            .unwrap_or_default()
    }

    pub fn list_values(&self, list: usize) -> Vec<String> {
        self.lists
            .get(list)
            .map(ListBlock::values)
            .unwrap_or_default()
    }

    /// Appends the blocks of another section.
    pub fn absorb(&mut self, other: PageContent) {
        self.tables.extend(other.tables);
        self.lists.extend(other.lists);
    }
}

/// Parses one section's rendered markup.
pub fn parse_section(markup: &str) -> PageContent {
    let fragment = Html::parse_fragment(markup);
    let root = fragment.root_element();

    let tables = elements_named(root, "tbody")
        .map(|tbody| {
            let rows = child_elements(tbody)
                .map(|row| child_elements(row).map(node_text).collect())
                .collect();
            TableBlock::new(rows)
        })
        .collect();

    let mut lists = Vec::new();
    for tag in LIST_TAGS {
        for list in elements_named(root, tag) {
            let items = child_elements(list)
                .filter(|item| ITEM_TAGS.contains(&item.value().name()))
                .map(|item| ListItem {
                    text: node_text(item),
                    has_sublist: child_elements(item)
                        .any(|child| LIST_TAGS.contains(&child.value().name())),
                })
                .collect();
            lists.push(ListBlock { items });
        }
    }

    PageContent { tables, lists }
}

fn elements_named<'a>(root: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == name)
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Text before the first child element; when blank, the text of the first
/// child element.
fn node_text(element: ElementRef<'_>) -> Option<String> {
    let mut leading = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => leading.push_str(text),
            Node::Element(_) => break,
            _ => {}
        }
    }
    if !leading.trim().is_empty() {
        return Some(leading);
    }
    child_elements(element).next().and_then(node_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = r#"<div class="mw-parser-output">
<h2>Mammals</h2>
<table class="wikitable"><tbody>
<tr><th>Animal</th><th> Young </th><th></th></tr>
<tr><td><a href="/wiki/Aardvark">Aardvark</a></td><td>cub</td><td>x</td></tr>
<tr><td>Badger
</td><td>kit</td></tr>
<tr><td>  </td><td>calf</td></tr>
</tbody></table>
<ul>
<li><a href="/wiki/Red">Red</a> – a primary colour</li>
<li>Shades of blue
<ul><li>Navy</li><li>Azure</li></ul>
</li>
<li>Green</li>
</ul>
<ol><li>First</li></ol>
<dl><dt>Term</dt><dd>Definition</dd></dl>
</div>"#;

    #[test]
    fn extracts_table_headers_and_columns() {
        let content = parse_section(SECTION);
        assert_eq!(content.table_count(), 1);
        assert_eq!(
            content.table_headers(0),
            Some(vec![
                Some("Animal".to_string()),
                Some("Young".to_string()),
                None,
            ])
        );
        assert_eq!(
            content.table_values_by_column(0, 0),
            vec!["Aardvark".to_string(), "Badger".to_string()]
        );
        assert_eq!(content.table_values_by_column(0, 2), vec!["x".to_string()]);
        assert!(content.table_values_by_column(3, 0).is_empty());
    }

    #[test]
    fn header_lookup_falls_back_to_trimmed_header() {
        let content = parse_section(SECTION);
        assert_eq!(
            content.table_values_by_header(0, "Young"),
            vec!["cub".to_string(), "kit".to_string(), "calf".to_string()]
        );
        assert_eq!(
            content.table_values_by_header(0, "  Animal\n"),
            vec!["Aardvark".to_string(), "Badger".to_string()]
        );
        assert!(content.table_values_by_header(0, "Female").is_empty());
    }

    #[test]
    fn lists_skip_items_holding_sublists() {
        let content = parse_section(SECTION);
        // outer ul, nested ul, ol, dl
        assert_eq!(content.list_count(), 4);
        assert_eq!(
            content.list_values(0),
            vec!["Red".to_string(), "Green".to_string()]
        );
        assert_eq!(
            content.list_values(1),
            vec!["Navy".to_string(), "Azure".to_string()]
        );
        assert_eq!(content.list_values(2), vec!["First".to_string()]);
        assert_eq!(content.list_values(3), vec!["Term".to_string()]);
    }

    #[test]
    fn absorb_appends_in_order() {
        let mut content = parse_section("<ul><li>One</li></ul>");
        content.absorb(parse_section("<ul><li>Two</li></ul>"));
        assert_eq!(content.list_values(0), vec!["One".to_string()]);
        assert_eq!(content.list_values(1), vec!["Two".to_string()]);
    }

    #[test]
    fn markup_without_blocks_is_empty() {
        let content = parse_section("<p>Nothing to see.</p>");
        assert_eq!(content, PageContent::default());
    }
}
