use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use ndarray::{ArrayD, arr2, arr3};

use mri_data::dataset::SampleStore;
use mri_data::error::DataError;
use mri_data::sample::SampleLayout;

fn write_sample<T: hdf5::H5Type>(
    path: &Path,
    image: &ArrayD<T>,
    label: &[f64],
    mask: &ArrayD<u8>,
) {
    let file = hdf5::File::create(path).unwrap();
    let group = file.create_group("cjdata").unwrap();
    group
        .new_dataset_builder()
        .with_data(image)
        .create("image")
        .unwrap();
    group
        .new_dataset_builder()
        .with_data(label)
        .create("label")
        .unwrap();
    group
        .new_dataset_builder()
        .with_data(mask)
        .create("tumorMask")
        .unwrap();
}

fn write_reference_sample(path: &Path) {
    write_sample(
        path,
        &arr2(&[[0.0f64, 2.0], [4.0, 8.0]]).into_dyn(),
        &[3.0],
        &arr2(&[[0u8, 0], [1, 1]]).into_dyn(),
    );
}

#[test]
fn get_normalizes_image_and_unwraps_label() {
    let temp = tempfile::tempdir().unwrap();
    write_reference_sample(&temp.path().join("1.mat"));

    let store = SampleStore::open(temp.path()).unwrap();
    assert_eq!(store.len(), 1);

    let sample = store.get(0).unwrap();
    assert_eq!(sample.image.shape(), &[1, 2, 2]);
    assert_eq!(sample.image, arr3(&[[[0.0f32, 0.25], [0.5, 1.0]]]).into_dyn());
    assert_eq!(sample.label, 3.0);
    assert_eq!(sample.mask, arr2(&[[0u8, 0], [1, 1]]).into_dyn());
}

#[test]
fn integer_images_are_scaled_into_unit_range() {
    let temp = tempfile::tempdir().unwrap();
    let image = arr2(&[[12i16, 400, 0], [37, 1200, 600]]).into_dyn();
    let mask = ArrayD::<u8>::zeros(image.raw_dim());
    write_sample(&temp.path().join("7.mat"), &image, &[1.0], &mask);

    let sample = SampleStore::open(temp.path()).unwrap().get(0).unwrap();
    assert!(sample.image.iter().all(|value| (0.0..=1.0).contains(value)));
    assert_eq!(sample.image[[0, 1, 1]], 1.0);
    assert_eq!(sample.image[[0, 1, 2]], 0.5);
}

#[test]
fn only_mat_files_are_indexed_in_name_order() {
    let temp = tempfile::tempdir().unwrap();
    for name in ["3.mat", "1.mat", "2.mat"] {
        write_reference_sample(&temp.path().join(name));
    }
    fs::write(temp.path().join("README.txt"), b"notes").unwrap();
    fs::write(temp.path().join("scan.MAT"), b"wrong case").unwrap();
    fs::create_dir(temp.path().join("folder.mat")).unwrap();

    let store = SampleStore::open(temp.path()).unwrap();
    assert_eq!(store.file_names(), &["1.mat", "2.mat", "3.mat"]);
    assert_eq!(store.path(2).unwrap(), temp.path().join("3.mat"));
}

#[test]
fn length_is_fixed_at_construction() {
    let temp = tempfile::tempdir().unwrap();
    write_reference_sample(&temp.path().join("1.mat"));
    write_reference_sample(&temp.path().join("2.mat"));

    let store = SampleStore::open(temp.path()).unwrap();
    write_reference_sample(&temp.path().join("3.mat"));
    fs::remove_file(temp.path().join("2.mat")).unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.get(0).is_ok());
    assert_matches!(store.get(1), Err(DataError::SampleRead { .. }));
    assert_matches!(
        store.get(2),
        Err(DataError::IndexOutOfRange { index: 2, len: 2 })
    );
}

#[test]
fn empty_directory_has_no_samples() {
    let temp = tempfile::tempdir().unwrap();
    let store = SampleStore::open(temp.path()).unwrap();
    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
    assert_matches!(
        store.get(0),
        Err(DataError::IndexOutOfRange { index: 0, len: 0 })
    );
}

#[test]
fn missing_directory_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let err = SampleStore::open(temp.path().join("mri_example/data")).unwrap_err();
    assert_matches!(err, DataError::DirectoryNotFound(_));
}

#[test]
fn repeated_reads_are_identical() {
    let temp = tempfile::tempdir().unwrap();
    write_reference_sample(&temp.path().join("1.mat"));
    let store = SampleStore::open(temp.path()).unwrap();

    let first = store.get(0).unwrap();
    let second = store.get(0).unwrap();
    assert_eq!(first, second);
    let first_bits: Vec<u32> = first.image.iter().map(|value| value.to_bits()).collect();
    let second_bits: Vec<u32> = second.image.iter().map(|value| value.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn all_zero_image_is_degenerate() {
    let temp = tempfile::tempdir().unwrap();
    let zeros = ArrayD::<f64>::zeros(ndarray::IxDyn(&[2, 2]));
    let mask = ArrayD::<u8>::zeros(ndarray::IxDyn(&[2, 2]));
    write_sample(&temp.path().join("blank.mat"), &zeros, &[2.0], &mask);

    let store = SampleStore::open(temp.path()).unwrap();
    assert_matches!(store.get(0), Err(DataError::DegenerateImage(_)));
}

#[test]
fn nan_pixel_is_degenerate() {
    let temp = tempfile::tempdir().unwrap();
    let image = arr2(&[[f64::NAN, 2.0], [4.0, 8.0]]).into_dyn();
    let mask = ArrayD::<u8>::zeros(image.raw_dim());
    write_sample(&temp.path().join("corrupt.mat"), &image, &[1.0], &mask);

    let store = SampleStore::open(temp.path()).unwrap();
    assert_matches!(store.get(0), Err(DataError::DegenerateImage(_)));
}

#[test]
fn missing_field_names_the_field() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("partial.mat");
    {
        let file = hdf5::File::create(&path).unwrap();
        let group = file.create_group("cjdata").unwrap();
        group
            .new_dataset_builder()
            .with_data(&[1.0f64])
            .create("label")
            .unwrap();
        group
            .new_dataset_builder()
            .with_data(&arr2(&[[1.0f64]]))
            .create("image")
            .unwrap();
    }

    let err = SampleStore::open(temp.path()).unwrap().get(0).unwrap_err();
    assert_matches!(err, DataError::MissingField { field, .. } if field == "cjdata/tumorMask");
}

#[test]
fn label_takes_first_element() {
    let temp = tempfile::tempdir().unwrap();
    write_sample(
        &temp.path().join("1.mat"),
        &arr2(&[[1.0f64, 2.0]]).into_dyn(),
        &[5.0, 9.0],
        &arr2(&[[0u8, 1]]).into_dyn(),
    );

    let sample = SampleStore::open(temp.path()).unwrap().get(0).unwrap();
    assert_eq!(sample.label, 5.0);
}

#[test]
fn empty_label_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("unlabelled.mat");
    {
        let file = hdf5::File::create(&path).unwrap();
        let group = file.create_group("cjdata").unwrap();
        group.new_dataset::<f64>().shape(0).create("label").unwrap();
        group
            .new_dataset_builder()
            .with_data(&arr2(&[[1.0f64]]))
            .create("image")
            .unwrap();
        group
            .new_dataset_builder()
            .with_data(&arr2(&[[0u8]]))
            .create("tumorMask")
            .unwrap();
    }

    let err = SampleStore::open(temp.path()).unwrap().get(0).unwrap_err();
    assert_matches!(err, DataError::EmptyLabel(reported) if reported == path);
}

#[test]
fn missing_group_names_the_group() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("other.mat");
    {
        let file = hdf5::File::create(&path).unwrap();
        let group = file.create_group("other").unwrap();
        group
            .new_dataset_builder()
            .with_data(&[1.0f64])
            .create("label")
            .unwrap();
    }

    let err = SampleStore::open(temp.path()).unwrap().get(0).unwrap_err();
    assert_matches!(err, DataError::MissingField { field, .. } if field == "cjdata");
}

#[test]
fn custom_layout_reads_other_group() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scan.h5");
    {
        let file = hdf5::File::create(&path).unwrap();
        let group = file.create_group("scan").unwrap();
        group
            .new_dataset_builder()
            .with_data(&[2.0f64])
            .create("y")
            .unwrap();
        group
            .new_dataset_builder()
            .with_data(&arr2(&[[5.0f64, 10.0]]))
            .create("x")
            .unwrap();
        group
            .new_dataset_builder()
            .with_data(&arr2(&[[0u8, 1]]))
            .create("m")
            .unwrap();
    }

    let layout = SampleLayout {
        group: "scan".to_string(),
        label: "y".to_string(),
        image: "x".to_string(),
        mask: "m".to_string(),
        extension: "h5".to_string(),
    };
    let store = SampleStore::with_layout(temp.path(), layout).unwrap();
    assert_eq!(store.root(), temp.path());
    assert_eq!(store.layout().group, "scan");
    assert_eq!(store.file_names(), &["scan.h5"]);
    let sample = store.get(0).unwrap();
    assert_eq!(sample.label, 2.0);
    assert_eq!(sample.image, arr3(&[[[0.5f32, 1.0]]]).into_dyn());
}

#[test]
fn concurrent_reads_share_one_store() {
    let temp = tempfile::tempdir().unwrap();
    for index in 0..4 {
        write_reference_sample(&temp.path().join(format!("{index}.mat")));
    }
    let store = SampleStore::open(temp.path()).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..store.len())
            .map(|index| {
                let store = &store;
                scope.spawn(move || store.get(index).unwrap())
            })
            .collect();
        for handle in handles {
            let sample = handle.join().unwrap();
            assert_eq!(sample.label, 3.0);
        }
    });

    let collected: Vec<_> = store.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(collected.len(), 4);
}
