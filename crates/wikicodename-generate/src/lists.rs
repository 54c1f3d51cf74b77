use wikicodename_core::Sources;
use wikicodename_wiki::PageContent;

/// Raw candidate values of one fetched page, before transforms.
///
/// Tables come first, each table contributing the columns of every wanted
/// header in order, then the items of every list when enabled.
pub fn collect_candidates(content: &PageContent, sources: &Sources) -> Vec<String> {
    let mut values = Vec::new();
    for table in content.tables() {
        for header in &sources.tables {
            values.extend(table.values_by_header(header));
        }
    }
    if sources.lists {
        for list in content.lists() {
            values.extend(list.values());
        }
    }
    values
}
