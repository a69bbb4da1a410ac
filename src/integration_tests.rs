//! End-to-end tests for the synchronization engine
//!
//! Edits go through a [`Prism`](crate::prism::Prism) exactly as an editor
//! would send them: structure is mirrored, rounds are translated with mock
//! backends, and the results are merged with human corrections.

#[cfg(test)]
mod tests {
    use crate::annotation::{Annotation, AnnotationStore, UPDATE_ANNOTATION};
    use crate::chunked::{Chunk, ChunkedText};
    use crate::config::PrismConfig;
    use crate::linear::LinearItem;
    use crate::model::document::tests::{list_json, paragraphs_json};
    use crate::model::{DataItem, Document, NodeId, NodeType, Transaction};
    use crate::mt::{BundledTranslator, DoublingTranslator, MockMode, MockTranslator, Translator};
    use crate::prism::{DirtyState, Prism, Side};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn prism(first: (&str, Value), second: (&str, Value), translator: Arc<dyn Translator>) -> Prism {
        let store = AnnotationStore::new();
        let first = Document::from_json(first.0, store.id(), first.1).unwrap();
        let second = Document::from_json(second.0, store.id(), second.1).unwrap();
        Prism::new(first, second, store, Some(translator), PrismConfig::default()).unwrap()
    }

    fn mappings(pairs: &[(&str, &str)]) -> Arc<dyn Translator> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Arc::new(BundledTranslator::new(MockTranslator::new(MockMode::Mappings(map))))
    }

    fn chars(text: &str) -> Vec<DataItem> {
        text.chars().map(|c| DataItem::Content(LinearItem::Plain(c))).collect()
    }

    fn node(prism: &Prism, side: Side, index: usize) -> NodeId {
        prism.document(side).content_branch_nodes()[index].id
    }

    /// Replace the text of a content node
    fn retype(prism: &mut Prism, side: Side, index: usize, text: &str) {
        let doc = prism.document(side);
        let target = doc.content_branch_nodes()[index].clone();
        let tx = Transaction::replacement(doc.data(), target.inner(), chars(text));
        prism.apply(side, tx).unwrap();
    }

    fn annotation_names(prism: &Prism, side: Side, index: usize) -> Vec<(String, String)> {
        let chunked = prism.document(side).chunked(node(prism, side, index)).unwrap();
        chunked
            .chunks
            .iter()
            .flat_map(|chunk| chunk.ann_list.iter().map(move |id| (chunk.text.clone(), id.clone())))
            .filter_map(|(text, id)| prism.store().get(&id).map(|a| (text, a.name.clone())))
            .collect()
    }

    // ========== Correction Adaptation ==========

    #[tokio::test(start_paused = true)]
    async fn test_corrections_survive_retranslation() {
        let translator = mappings(&[
            ("It is a big cat", "Es un gato gordo"),
            ("It is a big dog", "Es un perro gordo"),
        ]);
        // The approved Spanish corrects "gordo" to "grande"
        let mut prism = prism(
            ("en", paragraphs_json(&["It is a big cat"])),
            ("es", paragraphs_json(&["Es un gato grande"])),
            translator,
        );
        retype(&mut prism, Side::First, 0, "It is a big dog");
        let report = prism.run_until_idle().await.unwrap();

        assert_eq!(report.committed, 1);
        assert_eq!(prism.document(Side::Second).texts(), vec!["Es un perro grande"]);
        assert_eq!(
            annotation_names(&prism, Side::Second, 0),
            vec![("perro".to_string(), UPDATE_ANNOTATION.to_string())]
        );
        assert_eq!(
            prism.dirty_state(Side::Second, node(&prism, Side::Second, 0)),
            Some(DirtyState::Mt)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_annotations_follow_translation() {
        let translator = mappings(&[
            ("It is a big red Box", "Es una gran Caja roja"),
            ("It is a big RED Box", "Es una gran Caja ROJA"),
        ]);
        let mut prism = prism(("en", paragraphs_json(&[""])), ("es", paragraphs_json(&[""])), translator);
        let bold = prism.store_mut().hash(Annotation::new("textStyle/bold"));
        let content: Vec<DataItem> = "It is a big red Box"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let annotations = if (12..15).contains(&i) { vec![bold.clone()] } else { vec![] };
                DataItem::Content(LinearItem::new(c, annotations))
            })
            .collect();
        let tx = Transaction::insertion(prism.document(Side::First).data(), 1, content);
        prism.apply(Side::First, tx).unwrap();
        prism.run_until_idle().await.unwrap();

        let translated = prism.document(Side::Second).chunked(node(&prism, Side::Second, 0)).unwrap();
        assert_eq!(
            translated,
            ChunkedText::new("Es una gran Caja roja", vec![], vec![Chunk::new(17, "roja", vec![bold])])
        );
    }

    // ========== Both Directions ==========

    #[tokio::test(start_paused = true)]
    async fn test_edits_flow_both_ways_after_approval() {
        let translator = mappings(&[
            ("cat", "chat"),
            ("black cat", "chat noir"),
            ("chat noir", "black cat"),
            ("chat gris", "grey cat"),
        ]);
        let mut prism = prism(("en", paragraphs_json(&["cat"])), ("fr", paragraphs_json(&["chat"])), translator);

        retype(&mut prism, Side::First, 0, "black cat");
        prism.run_until_idle().await.unwrap();
        assert_eq!(prism.document(Side::Second).texts(), vec!["chat noir"]);
        assert_eq!(
            annotation_names(&prism, Side::Second, 0),
            vec![(" noir".to_string(), UPDATE_ANNOTATION.to_string())]
        );

        let french = node(&prism, Side::Second, 0);
        prism.mark_approved(Side::Second, french).unwrap();
        assert!(annotation_names(&prism, Side::Second, 0).is_empty());

        retype(&mut prism, Side::Second, 0, "chat gris");
        let english = node(&prism, Side::First, 0);
        assert_eq!(prism.dirty_state(Side::First, english), Some(DirtyState::Mt));
        prism.run_until_idle().await.unwrap();
        assert_eq!(prism.document(Side::First).texts(), vec!["grey cat"]);
        assert_eq!(prism.document(Side::Second).texts(), vec!["chat gris"]);
        assert_eq!(prism.dirty_state(Side::Second, french), Some(DirtyState::Approved));
    }

    // ========== Structure ==========

    #[tokio::test(start_paused = true)]
    async fn test_split_on_target_side_translates_back() {
        let mut prism = prism(
            ("en", list_json("cat", "dog")),
            ("fr", list_json("CCAATT", "DDOOGG")),
            Arc::new(DoublingTranslator::new()),
        );
        let tx = Transaction::insertion(
            prism.document(Side::Second).data(),
            6,
            vec![
                DataItem::Close(NodeType::Paragraph),
                DataItem::Close(NodeType::ListItem),
                DataItem::open(NodeType::ListItem),
                DataItem::open(NodeType::Paragraph),
            ],
        );
        prism.apply(Side::Second, tx).unwrap();
        assert_eq!(prism.document(Side::Second).texts(), vec!["CCA", "ATT", "DDOOGG"]);
        assert_eq!(prism.document(Side::First).texts(), vec!["cat", "", "dog"]);
        assert_eq!(prism.pending_len(), 2);

        let report = prism.run_until_idle().await.unwrap();
        assert_eq!(report.committed, 2);
        assert_eq!(prism.document(Side::First).texts(), vec!["CCCCAA", "AATTTT", "dog"]);
        assert_eq!(prism.document(Side::First).shape(), prism.document(Side::Second).shape());

        // "cat" was a human translation, so the first item is a conflict
        let first = node(&prism, Side::First, 0);
        let view = prism.render_conflict(Side::First, first, 0).unwrap().unwrap();
        assert_eq!(view.correction, "cat");
        assert_eq!(view.new_mt, "CCCCAA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_node_leaves_queue() {
        let mut prism = prism(
            ("en", list_json("cat", "dog")),
            ("fr", list_json("chat", "chien")),
            Arc::new(DoublingTranslator::new()),
        );
        retype(&mut prism, Side::First, 1, "dogs");
        assert_eq!(prism.pending_len(), 1);

        let tx = Transaction::removal(prism.document(Side::Second).data(), 9..18);
        prism.apply(Side::Second, tx).unwrap();
        assert_eq!(prism.document(Side::First).texts(), vec!["cat"]);

        let report = prism.run_until_idle().await.unwrap();
        assert_eq!(report.committed, 0);
        assert_eq!(prism.pending_len(), 0);
        assert_eq!(prism.document(Side::Second).texts(), vec!["chat"]);
    }

    // ========== History ==========

    #[tokio::test(start_paused = true)]
    async fn test_history_records_every_commit() {
        let mut prism = prism(
            ("en", paragraphs_json(&["cat"])),
            ("fr", paragraphs_json(&["CCAATT"])),
            Arc::new(DoublingTranslator::new()),
        );
        let mut events = prism.history().subscribe();
        retype(&mut prism, Side::First, 0, "dog");
        prism.run_until_idle().await.unwrap();

        let mut received = 0;
        while events.try_recv().is_ok() {
            received += 1;
        }
        let history = prism.history();
        assert_eq!(received, history.len() - 1);
        for index in 0..history.len() {
            assert!(history.pair_at(index).is_ok());
        }
        assert_eq!(
            history.lengths_at(history.len() - 1),
            Some((prism.document(Side::First).len(), prism.document(Side::Second).len()))
        );
    }
}
