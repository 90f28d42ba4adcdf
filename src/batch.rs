use crate::classifier::{ClassifyRequest, Input};

/// 一次发送给分类服务的一组图片
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 批次序号，等于提交顺序
    pub key: usize,
    pub items: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 构造该批次对应的请求体
    pub fn request(&self) -> ClassifyRequest {
        ClassifyRequest { inputs: self.items.iter().map(Input::image_url).collect() }
    }
}

/// 按 `batch_size` 将图片地址切分为批次，保持原有顺序，不会产生空批次
pub fn make_batches<I>(items: I, batch_size: usize) -> Vec<Batch>
where
    I: IntoIterator<Item = String>,
{
    let batch_size = batch_size.max(1);
    let mut batches = vec![];
    let mut current = Vec::with_capacity(batch_size);

    for item in items {
        current.push(item);
        if current.len() == batch_size {
            let items = std::mem::replace(&mut current, Vec::with_capacity(batch_size));
            batches.push(Batch { key: batches.len(), items });
        }
    }
    if !current.is_empty() {
        batches.push(Batch { key: batches.len(), items: current });
    }

    batches
}
