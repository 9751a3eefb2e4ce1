use regex::Regex;
use std::{fmt::Debug, iter::zip};

pub fn assert_re(pattern: &str, haystack: &str) {
    let re = Regex::new(pattern).unwrap();
    assert!(re.is_match(haystack), "{:?} did not match {:?}", haystack, re);
}

fn eprint_vecs<T: PartialEq + Debug>(left: &Vec<T>, right: &Vec<T>) {
    let mut err_str = "left != right. left: [\n".to_string();
    for o in left {
        err_str += &format!("{:?},\n", o).to_string();
    }
    err_str += "] != right: [\n";
    for o in right {
        err_str += &format!("{:?},\n", o).to_string();
    }
    eprintln!("{}", err_str);
}

pub fn assert_vec_eq<T: PartialEq + Debug>(left: Vec<T>, right: Vec<T>) {
    assert_vecr_eq(&left, &right);
}

pub fn assert_vecr_eq<T: PartialEq + Debug>(left: &Vec<T>, right: &Vec<T>) {
    if left == right {
        return;
    }
    eprint_vecs(left, right);

    if left.len() != right.len() {
        eprintln!(
            "size of left ({}) != size of right ({})",
            left.len(),
            right.len()
        );
        panic!();
    }
    let mut i = 0;
    for (l, r) in zip(left, right) {
        if l != r {
            eprintln!("Mismatch at index {}:", i);
            eprintln!("left: {:#?} != right: {:#?}", l, r);
        }
        i += 1;
    }
    panic!();
}

/// In-memory worksheet construction, used by unit and integration tests in
/// place of actual .xlsx files.
pub mod sheet {
    use calamine::{Data, Range};

    /// Sheets are built wider than the blank-row scan window, so that
    /// page-footer cells land past it like they do in real reports.
    pub const TEST_SHEET_WIDTH: usize = 60;

    pub fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    pub fn f(v: f64) -> Data {
        Data::Float(v)
    }

    pub fn i(v: i64) -> Data {
        Data::Int(v)
    }

    pub fn e() -> Data {
        Data::Empty
    }

    pub fn build_sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len().max(1);
        let width = rows
            .iter()
            .map(|r| r.len())
            .max()
            .unwrap_or(0)
            .max(TEST_SHEET_WIDTH);
        let mut range = Range::new(
            (0, 0),
            ((height - 1) as u32, (width - 1) as u32),
        );
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                if !matches!(cell, Data::Empty) {
                    range.set_value((r as u32, c as u32), cell);
                }
            }
        }
        range
    }
}
