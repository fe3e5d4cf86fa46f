use crate::types::{Candidate, CandidateUrl};
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// 驗證候選、單次呼叫內去重、截斷到 `count`
pub fn collect_valid(candidates: Vec<Candidate>, count: usize) -> Vec<CandidateUrl> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(CandidateUrl::from_candidate)
        .filter(|url| seen.insert(url.as_str().to_string()))
        .take(count)
        .collect()
}

/// 合併後去重（第一次出現者保留），並再次驗證
pub fn dedup_valid(urls: Vec<CandidateUrl>) -> Vec<CandidateUrl> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| url.revalidate())
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// 隨機打亂後取前 `count` 個
pub fn shuffle_truncate(mut urls: Vec<CandidateUrl>, count: usize) -> Vec<CandidateUrl> {
    urls.shuffle(&mut rand::rng());
    urls.truncate(count);
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(name: &str) -> CandidateUrl {
        CandidateUrl::new(format!("https://cdn.example.com/{}.jpg", name), false).unwrap()
    }

    #[test]
    fn test_collect_valid() {
        let candidates = vec![
            Candidate::new("https://cdn.example.com/a.jpg"),
            Candidate::new("https://cdn.example.com/page.html"),
            Candidate::new("https://cdn.example.com/a.jpg"),
            Candidate::trusted("https://images.example.com/photo-1"),
            Candidate::new("https://cdn.example.com/b.png"),
        ];
        let urls: Vec<String> = collect_valid(candidates, 2)
            .into_iter()
            .map(|u| u.into_string())
            .collect();
        assert_eq!(
            urls,
            vec!["https://cdn.example.com/a.jpg", "https://images.example.com/photo-1"]
        );
    }

    #[test]
    fn test_dedup_keeps_first() {
        let merged = vec![url("a"), url("b"), url("a"), url("c"), url("b")];
        assert_eq!(dedup_valid(merged), vec![url("a"), url("b"), url("c")]);
    }

    #[test]
    fn test_shuffle_truncate() {
        let all: Vec<CandidateUrl> = (0..20).map(|i| url(&i.to_string())).collect();
        let out = shuffle_truncate(all.clone(), 5);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|u| all.contains(u)));
        assert_eq!(shuffle_truncate(all.clone(), 50).len(), 20);
    }
}
