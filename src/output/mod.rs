pub mod formatter;

pub use formatter::{
    format_age, format_calculation, format_course_list, format_cutoff, format_history_table,
    format_history_tsv, format_institution_detail, format_institution_list, format_news,
    format_sources, should_use_colors,
};
