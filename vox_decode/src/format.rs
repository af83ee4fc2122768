/// Scalar type of voxel and vertex attribute data
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
}

impl DataType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::Uint8 => 1,
            DataType::Uint16 => 2,
            DataType::Uint32 => 4,
            DataType::Uint64 => 8,
            DataType::Float32 => 4,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(DataType::Uint8.size_in_bytes(), 1);
        assert_eq!(DataType::Uint16.size_in_bytes(), 2);
        assert_eq!(DataType::Uint64.size_in_bytes(), 8);
        assert!(DataType::Float32.is_float());
        assert!(!DataType::Uint32.is_float());
    }
}
