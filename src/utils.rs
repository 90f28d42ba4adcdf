use indicatif::ProgressStyle;

/// 进度条样式
pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} 批次 {msg}")
        .expect("进度条模板无效")
        .progress_chars("##-")
}
